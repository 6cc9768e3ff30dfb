//! HTTP plumbing underneath the resource wrappers.
//!
//! Resources only ever talk to a [`Transport`]. The production implementation
//! is [`HttpTransport`] (blocking reqwest); [`LoggingTransport`] wraps any
//! transport to record traffic at debug level. Tests substitute scripted
//! transports that replay canned [`Response`]s.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{HttpError, Result};

mod http;
mod logging;

pub use http::HttpTransport;
pub use logging::LoggingTransport;

/// Query string pairs, in the order they should be sent.
pub type Params = Vec<(String, String)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Empty,
    Json(Value),
    Text(String),
}

#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub params: Params,
    pub body: Body,
}

impl Request {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            params: Vec::new(),
            body: Body::Empty,
        }
    }

    pub fn params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// The JSON body, if one was attached.
    pub fn json(&self) -> Option<&Value> {
        match &self.body {
            Body::Json(value) => Some(value),
            _ => None,
        }
    }
}

/// A fully read HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    /// Header names are stored lowercased.
    pub headers: BTreeMap<String, String>,
    /// Body decoded with the charset the server declared.
    pub text: String,
    /// Raw body, kept only when the Content-Type is not textual.
    pub bytes: Vec<u8>,
}

impl Response {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            text: String::new(),
            bytes: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_bytes(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.bytes = bytes.into();
        self.text = String::from_utf8_lossy(&self.bytes).into_owned();
        self
    }

    pub fn with_json(self, value: Value) -> Self {
        self.with_header("content-type", "application/json")
            .with_text(value.to_string())
    }

    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// The body as sent when it was kept raw, otherwise the decoded text.
    pub fn into_bytes(self) -> Vec<u8> {
        if self.bytes.is_empty() {
            self.text.into_bytes()
        } else {
            self.bytes
        }
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.text)?)
    }

    /// Turns a non-2xx response into [`HttpError`].
    pub fn error_for_status(self, url: &str) -> Result<Self> {
        if self.ok() {
            Ok(self)
        } else {
            Err(HttpError::new(url, self).into())
        }
    }
}

/// An authenticated HTTP session.
///
/// Implementations only provide [`Transport::send`], which returns whatever the
/// server answered. The verb helpers turn non-2xx answers into
/// [`crate::Error::Http`], which is what every resource expects.
pub trait Transport: Send + Sync {
    fn send(&self, request: Request) -> Result<Response>;

    fn execute(&self, request: Request) -> Result<Response> {
        let url = request.url.clone();
        self.send(request)?.error_for_status(&url)
    }

    fn get(&self, url: &str, params: Params) -> Result<Response> {
        self.execute(Request::new(Method::Get, url).params(params))
    }

    fn post(&self, url: &str, body: Body) -> Result<Response> {
        self.execute(Request::new(Method::Post, url).body(body))
    }

    fn put(&self, url: &str, body: Body) -> Result<Response> {
        self.execute(Request::new(Method::Put, url).body(body))
    }

    fn delete(&self, url: &str, body: Body) -> Result<Response> {
        self.execute(Request::new(Method::Delete, url).body(body))
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: Request) -> Result<Response> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, request: Request) -> Result<Response> {
        (**self).send(request)
    }
}

/// Builds query parameters, dropping filters the caller left unset.
pub fn params<I, K>(pairs: I) -> Params
where
    I: IntoIterator<Item = (K, Option<String>)>,
    K: Into<String>,
{
    pairs
        .into_iter()
        .filter_map(|(key, value)| value.map(|value| (key.into(), value)))
        .collect()
}
