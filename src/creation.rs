//! The `POST` + `201 Created` + `Location` choreography shared by every
//! resource that the server assigns an id to.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CreationError, Error, Result};
use crate::transport::{Body, Response, Transport};

pub const HTTP_CREATED: u16 = 201;
const HTTP_BAD_REQUEST: u16 = 400;

/// Id recovered from the `Location` header of a creation response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CreatedResource {
    pub id: u64,
}

/// POSTs `body` to `url` and recovers the id of the new resource.
///
/// Not idempotent: calling this twice with the same body creates two resources.
pub fn create(
    transport: &dyn Transport,
    url: &str,
    body: Value,
    resource: &'static str,
) -> Result<CreatedResource> {
    let response = transport
        .post(url, Body::Json(body))
        .map_err(server_validation)?;
    let created = created_id(&response, HTTP_CREATED, resource)?;
    info!("[create] {resource} created with id {}", created.id);
    Ok(created)
}

/// Checks the creation status and parses the trailing `/<digits>` of `Location`.
pub fn created_id(
    response: &Response,
    expected_status: u16,
    resource: &'static str,
) -> Result<CreatedResource> {
    if response.status != expected_status {
        return Err(CreationError::UnexpectedStatus {
            resource,
            status: response.status,
        }
        .into());
    }

    let location = response
        .header("Location")
        .ok_or(CreationError::MissingLocation { resource })?;
    debug!("[create] {resource} Location: {location}");

    trailing_id(location).map(|id| CreatedResource { id }).ok_or_else(|| {
        CreationError::IdNotFound {
            resource,
            location: location.to_string(),
        }
        .into()
    })
}

fn trailing_id(location: &str) -> Option<u64> {
    let (_, last) = location.rsplit_once('/')?;
    if last.is_empty() || !last.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    last.parse().ok()
}

/// Re-labels a 400 that carries a `description` as a server-side validation
/// failure. Anything else comes back untouched.
pub fn server_validation(err: Error) -> Error {
    match err {
        Error::Http(http) if http.status() == HTTP_BAD_REQUEST => {
            match http.body().and_then(|body| body.description) {
                Some(description) => Error::ServerValidation {
                    status: HTTP_BAD_REQUEST,
                    description,
                },
                None => Error::Http(http),
            }
        }
        other => other,
    }
}

/// Adds caller-supplied passthrough fields to a request body. A key that the
/// body already defines is refused rather than overwritten.
pub fn merge_extra(body: &mut Value, extra: &Map<String, Value>) -> Result<()> {
    let Value::Object(fields) = body else {
        return Err(Error::validation("request body is not a JSON object"));
    };
    for (key, value) in extra {
        if fields.contains_key(key) {
            return Err(Error::validation(format!(
                "extra field '{key}' collides with a named parameter"
            )));
        }
        fields.insert(key.clone(), value.clone());
    }
    Ok(())
}
