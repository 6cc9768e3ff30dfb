use std::sync::Arc;

use log::info;
use serde_json::{Value, json};

use crate::cache::Cached;
use crate::creation::server_validation;
use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::paginate::{PageRequest, paginate};
use crate::transport::{Body, Params, Transport};

/// Domain control validation (`/dcv`).
pub struct DomainControlValidation {
    endpoint: Endpoint,
    domains: Cached<Vec<Value>>,
}

impl DomainControlValidation {
    pub const SERVICE: &'static str = "/dcv";

    pub fn new(transport: Arc<dyn Transport>, base_url: &str) -> Self {
        Self::with_api_version(transport, base_url, "v1")
    }

    pub fn with_api_version(transport: Arc<dyn Transport>, base_url: &str, version: &str) -> Self {
        Self {
            endpoint: Endpoint::new(transport, base_url, Self::SERVICE, version),
            domains: Cached::new("dcv domains"),
        }
    }

    /// Validation state of every domain, walked page by page.
    pub fn all(&self, force: bool) -> Result<Vec<Value>> {
        let filter = Params::new();
        self.domains.get_or_fetch(force, || {
            self.search(&filter, PageRequest::default()).collect()
        })
    }

    pub fn search<'a>(
        &'a self,
        filter: &'a Params,
        start: PageRequest,
    ) -> impl Iterator<Item = Result<Value>> + 'a {
        let url = self.endpoint.url(&["validation"]);
        paginate(start, move |page| {
            let mut params = page.params();
            params.extend(filter.iter().cloned());
            self.endpoint
                .transport()
                .get(&url, params)?
                .json::<Vec<Value>>()
        })
    }

    pub fn get_validation_status(&self, domain: &str) -> Result<Value> {
        self.post(&["validation", "status"], json!({ "domain": domain }))
    }

    pub fn start_validation_cname(&self, domain: &str) -> Result<Value> {
        info!("[dcv] starting CNAME validation for {domain}");
        self.post(
            &["validation", "start", "domain", "cname"],
            json!({ "domain": domain }),
        )
    }

    pub fn start_validation_email(&self, domain: &str) -> Result<Value> {
        info!("[dcv] starting e-mail validation for {domain}");
        self.post(
            &["validation", "start", "domain", "email"],
            json!({ "domain": domain }),
        )
    }

    pub fn submit_validation_cname(&self, domain: &str) -> Result<Value> {
        self.post(
            &["validation", "submit", "domain", "cname"],
            json!({ "domain": domain }),
        )
    }

    /// `email` must be one of the addresses offered when validation started.
    pub fn submit_validation_email(&self, domain: &str, email: &str) -> Result<Value> {
        self.post(
            &["validation", "submit", "domain", "email"],
            json!({ "domain": domain, "email": email }),
        )
    }

    fn post(&self, path: &[&str], body: Value) -> Result<Value> {
        let url = self.endpoint.url(path);
        self.endpoint
            .transport()
            .post(&url, Body::Json(body))
            .map_err(server_validation)?
            .json()
    }
}
