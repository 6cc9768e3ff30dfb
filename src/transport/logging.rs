use log::{Level, debug, log_enabled};

use super::{Body, Request, Response, Transport};
use crate::error::Result;

const REDACTED_HEADERS: &[&str] = &["password"];

/// Logs every request and response passing through the wrapped transport.
///
/// Output goes to `debug`, so nothing is formatted unless that level is on.
/// Never enable debug logging in production: bodies may contain CSRs and PII.
pub struct LoggingTransport<T> {
    inner: T,
}

impl<T: Transport> LoggingTransport<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T: Transport> Transport for LoggingTransport<T> {
    fn send(&self, request: Request) -> Result<Response> {
        if !log_enabled!(Level::Debug) {
            return self.inner.send(request);
        }

        debug!(
            "[traffic] Performing a {} on url: {}",
            request.method.as_str(),
            request.url
        );
        if !request.params.is_empty() {
            debug!("[traffic] Query parameters: {:?}", request.params);
        }
        if !request.headers.is_empty() {
            debug!("[traffic] Extra request headers: {:?}", redact(&request.headers));
        }
        match &request.body {
            Body::Empty => {}
            Body::Json(value) => debug!("[traffic] Data: {value}"),
            Body::Text(text) => debug!("[traffic] Data: {text}"),
        }

        match self.inner.send(request) {
            Ok(response) => {
                log_response(&response);
                Ok(response)
            }
            Err(err) => {
                debug!("[traffic] Request failed: {err}");
                Err(err)
            }
        }
    }
}

fn log_response(response: &Response) {
    debug!("[traffic] Result code: {}", response.status);
    debug!("[traffic] Result headers: {:?}", response.headers);
    debug!("[traffic] Text result: {}", response.text);
}

fn redact(headers: &[(String, String)]) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            if REDACTED_HEADERS
                .iter()
                .any(|secret| name.eq_ignore_ascii_case(secret))
            {
                (name.clone(), "<redacted>".to_string())
            } else {
                (name.clone(), value.clone())
            }
        })
        .collect()
}
