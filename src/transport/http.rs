use std::collections::BTreeMap;
use std::fs;
use std::sync::RwLock;

use log::debug;
use mime::Mime;
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};

use super::{Body, Method, Request, Response, Transport};
use crate::config::{Auth, ClientConfig};
use crate::error::{Error, Result};

/// Blocking reqwest session carrying the Certificate Manager auth headers.
///
/// One instance can be shared by every resource object; reqwest pools
/// connections internally and the header set is guarded by a lock.
pub struct HttpTransport {
    client: Client,
    headers: RwLock<BTreeMap<String, String>>,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = Client::builder().timeout(config.timeout);
        if let Auth::Certificate {
            cert_file,
            key_file,
        } = &config.auth
        {
            let cert = fs::read(cert_file).map_err(|err| {
                Error::config(format!("failed to read {}: {err}", cert_file.display()))
            })?;
            let key = fs::read(key_file).map_err(|err| {
                Error::config(format!("failed to read {}: {err}", key_file.display()))
            })?;
            let identity = reqwest::Identity::from_pkcs8_pem(&cert, &key)
                .map_err(|err| Error::config(format!("invalid client certificate: {err}")))?;
            builder = builder.identity(identity);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            headers: RwLock::new(config.default_headers().into_iter().collect()),
        })
    }

    /// Snapshot of the headers sent with every request.
    pub fn headers(&self) -> BTreeMap<String, String> {
        self.headers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Adds or overwrites session headers. Names match case-insensitively and
    /// the spelling given last is kept.
    pub fn add_headers<I, K, V>(&self, headers: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut current = self
            .headers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for (name, value) in headers {
            let name = name.into();
            current.retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
            current.insert(name, value.into());
        }
    }

    /// Removes session headers regardless of case; names that are not set
    /// are ignored.
    pub fn remove_headers<I, K>(&self, names: I)
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let mut current = self
            .headers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for name in names {
            let name = name.as_ref();
            current.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
        }
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: Request) -> Result<Response> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let headers = header_map(&self.headers(), &request.headers)?;
        let mut builder = self.client.request(method, &request.url).headers(headers);
        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }
        builder = match request.body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(&value),
            Body::Text(text) => builder.body(text),
        };

        let response = builder.send()?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_ascii_lowercase(), value.to_string()))
            })
            .collect();
        let binary = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<Mime>().ok())
            .is_some_and(|content_type| !is_textual(&content_type));
        let (text, bytes) = if binary {
            let bytes = response.bytes()?.to_vec();
            (String::from_utf8_lossy(&bytes).into_owned(), bytes)
        } else {
            // reqwest decodes with the charset from Content-Type, falling back to UTF-8.
            (response.text()?, Vec::new())
        };
        debug!("[http] {} {} -> {}", request.method.as_str(), request.url, status);

        Ok(Response {
            status,
            headers,
            text,
            bytes,
        })
    }
}

/// Session headers overlaid with the per-request ones. Both sides are
/// matched case-insensitively, so a request header replaces its session
/// counterpart instead of being sent next to it.
fn header_map(
    session: &BTreeMap<String, String>,
    extra: &[(String, String)],
) -> Result<HeaderMap> {
    let pairs = session
        .iter()
        .chain(extra.iter().map(|(name, value)| (name, value)));
    let mut map = HeaderMap::new();
    for (name, value) in pairs {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|err| Error::validation(format!("invalid header name {name}: {err}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|err| Error::validation(format!("invalid value for header {name}: {err}")))?;
        map.insert(name, value);
    }
    Ok(map)
}

fn is_textual(content_type: &Mime) -> bool {
    content_type.get_param(mime::CHARSET).is_some()
        || content_type.type_() == mime::TEXT
        || content_type.subtype() == mime::JSON
        || content_type.suffix() == Some(mime::JSON)
        || content_type.subtype() == mime::XML
}
