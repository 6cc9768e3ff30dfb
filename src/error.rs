use serde::Deserialize;
use thiserror::Error;

use crate::transport::Response;

/// Result type for Certificate Manager operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the client.
#[derive(Error, Debug)]
pub enum Error {
    /// The server answered with a non-2xx status that nothing reinterpreted.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The request never produced an HTTP response (connect, TLS, timeout).
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// A response body was not the JSON shape we expected.
    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// A local precondition failed; no request was sent.
    #[error("invalid input: {0}")]
    Validation(String),

    /// A custom field entry is not a name/value object.
    #[error("invalid custom field entry: {0}")]
    CustomFieldType(String),

    /// The server rejected the request data and said why.
    #[error("server rejected request ({status}): {description}")]
    ServerValidation { status: u16, description: String },

    /// A creation endpoint broke its documented contract.
    #[error(transparent)]
    Creation(#[from] CreationError),

    /// The client configuration is unusable.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// HTTP status of the underlying response, when there is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http(err) => Some(err.status()),
            Error::ServerValidation { status, .. } => Some(*status),
            Error::Request(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }
}

/// A non-2xx response, kept whole so callers can inspect what the server sent.
#[derive(Error, Debug, Clone)]
#[error("HTTP {} from {url}", .response.status)]
pub struct HttpError {
    pub url: String,
    pub response: Response,
}

impl HttpError {
    pub fn new(url: impl Into<String>, response: Response) -> Self {
        Self {
            url: url.into(),
            response,
        }
    }

    pub fn status(&self) -> u16 {
        self.response.status
    }

    /// Parses the Certificate Manager error body (`{code, description}`).
    pub fn body(&self) -> Option<ErrorBody> {
        serde_json::from_str(&self.response.text).ok()
    }
}

/// Error body returned by the Certificate Manager on failed requests.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Ways a creation endpoint can violate its `201 + Location` contract.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CreationError {
    #[error("{resource} creation returned unexpected HTTP status {status}")]
    UnexpectedStatus { resource: &'static str, status: u16 },
    #[error("{resource} creation response does not include a Location header")]
    MissingLocation { resource: &'static str },
    #[error("did not find a {resource} ID in response Location URL: {location}")]
    IdNotFound {
        resource: &'static str,
        location: String,
    },
}
