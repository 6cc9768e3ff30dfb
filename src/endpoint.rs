//! Resource endpoint addressing.
//!
//! Every resource lives at `<base_url>/<service>/<version>[/<sub path>]`, e.g.
//! `https://cert-manager.com/api/ssl/v1`. A handful of operations live under a
//! newer API version than the rest of their resource; [`Endpoint::with_api_version`]
//! runs such a call against a re-versioned copy so the resource's own address
//! never changes, whichever way the call exits.

use std::sync::Arc;

use log::debug;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::transport::Transport;

/// Characters left as-is when a value is embedded in a path segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

#[derive(Clone)]
pub struct Endpoint {
    transport: Arc<dyn Transport>,
    base_url: String,
    service: String,
    api_version: String,
    sub_path: Option<String>,
    api_url: String,
}

impl Endpoint {
    pub fn new(
        transport: Arc<dyn Transport>,
        base_url: &str,
        service: &str,
        api_version: &str,
    ) -> Self {
        let api_url = Self::create_api_url(base_url, service, api_version);
        Self {
            transport,
            base_url: base_url.to_string(),
            service: service.to_string(),
            api_version: api_version.to_string(),
            sub_path: None,
            api_url,
        }
    }

    /// Joins base URL, service and version, collapsing the slashes between them.
    pub fn create_api_url(base_url: &str, service: &str, version: &str) -> String {
        let url = format!(
            "{}/{}/{}",
            base_url.trim_end_matches('/'),
            service.trim_matches('/'),
            version.trim_matches('/')
        );
        debug!("[endpoint] URL created: {url}");
        url
    }

    /// Re-roots this endpoint below a fixed sub path (ACME accounts live at `/acme/v1/account`).
    pub fn nested(mut self, sub_path: &str) -> Self {
        self.api_url = self.url(&[sub_path]);
        self.sub_path = Some(sub_path.trim_matches('/').to_string());
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Builds a URL below the API URL from one or more path parts.
    pub fn url(&self, parts: &[&str]) -> String {
        let mut url = self.api_url.trim_end_matches('/').to_string();
        for part in parts {
            let part = part.trim_matches('/');
            if part.is_empty() {
                continue;
            }
            url.push('/');
            url.push_str(part);
        }
        url
    }

    /// Runs `call` against this endpoint re-addressed to `version`.
    pub fn with_api_version<R>(&self, version: &str, call: impl FnOnce(&Endpoint) -> R) -> R {
        let mut scoped = self.clone();
        scoped.api_version = version.to_string();
        scoped.api_url = Self::create_api_url(&self.base_url, &self.service, version);
        if let Some(sub_path) = &self.sub_path {
            scoped.api_url = scoped.url(&[sub_path.as_str()]);
        }
        debug!(
            "[endpoint] {} temporarily addressed as {}",
            self.api_url, scoped.api_url
        );
        call(&scoped)
    }
}

/// Percent-encodes a value for use as a single path segment.
pub fn encode_segment(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT).to_string()
}
