use std::sync::Arc;

use log::info;
use serde_json::{Map, Value, json};

use crate::cache::Cached;
use crate::creation::{CreatedResource, create, merge_extra};
use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::transport::{Body, Params, Transport};

/// Domains registered with the account (`/domain`).
pub struct Domain {
    endpoint: Endpoint,
    domains: Cached<Vec<Value>>,
}

/// A new domain, delegated to one organization on creation.
#[derive(Debug, Clone)]
pub struct NewDomain {
    pub name: String,
    pub org_id: u64,
    /// Certificate kinds the delegation covers, e.g. `SSL`, `SMIME`.
    pub cert_types: Vec<String>,
    pub extra: Map<String, Value>,
}

impl Domain {
    pub const SERVICE: &'static str = "/domain";

    pub fn new(transport: Arc<dyn Transport>, base_url: &str) -> Self {
        Self::with_api_version(transport, base_url, "v1")
    }

    pub fn with_api_version(transport: Arc<dyn Transport>, base_url: &str, version: &str) -> Self {
        Self {
            endpoint: Endpoint::new(transport, base_url, Self::SERVICE, version),
            domains: Cached::new("domains"),
        }
    }

    /// Every domain, fetched with a single unpaginated request.
    pub fn all(&self, force: bool) -> Result<Vec<Value>> {
        self.domains.get_or_fetch(force, || self.find(&Vec::new()))
    }

    pub fn find(&self, params: &Params) -> Result<Vec<Value>> {
        self.endpoint
            .transport()
            .get(self.endpoint.api_url(), params.clone())?
            .json()
    }

    pub fn count(&self, params: &Params) -> Result<Value> {
        let url = self.endpoint.url(&["/count"]);
        self.endpoint.transport().get(&url, params.clone())?.json()
    }

    pub fn create(&self, domain: &NewDomain) -> Result<CreatedResource> {
        let mut body = json!({
            "name": domain.name,
            "delegations": [{"orgId": domain.org_id, "certTypes": domain.cert_types}],
        });
        merge_extra(&mut body, &domain.extra)?;
        let created = create(self.endpoint.transport(), self.endpoint.api_url(), body, "Domain")?;
        self.domains.invalidate();
        Ok(created)
    }

    pub fn get(&self, domain_id: u64) -> Result<Value> {
        let url = self.endpoint.url(&[&domain_id.to_string()]);
        self.endpoint.transport().get(&url, Vec::new())?.json()
    }

    pub fn delete(&self, domain_id: u64) -> Result<()> {
        let url = self.endpoint.url(&[&domain_id.to_string()]);
        self.endpoint.transport().delete(&url, Body::Empty)?;
        self.domains.invalidate();
        info!("[domain] deleted domain {domain_id}");
        Ok(())
    }

    pub fn activate(&self, domain_id: u64) -> Result<()> {
        let url = self.endpoint.url(&[&domain_id.to_string(), "activate"]);
        self.endpoint.transport().put(&url, Body::Empty)?;
        Ok(())
    }

    pub fn suspend(&self, domain_id: u64) -> Result<()> {
        let url = self.endpoint.url(&[&domain_id.to_string(), "suspend"]);
        self.endpoint.transport().put(&url, Body::Empty)?;
        Ok(())
    }

    pub fn delegate(&self, domain_id: u64, org_id: u64, cert_types: &[String]) -> Result<()> {
        let url = self.endpoint.url(&[&domain_id.to_string(), "delegation"]);
        let body = json!({"orgId": org_id, "certTypes": cert_types});
        self.endpoint.transport().post(&url, Body::Json(body))?;
        Ok(())
    }

    pub fn remove_delegation(
        &self,
        domain_id: u64,
        org_id: u64,
        cert_types: &[String],
    ) -> Result<()> {
        let url = self.endpoint.url(&[&domain_id.to_string(), "delegation"]);
        let body = json!({"orgId": org_id, "certTypes": cert_types});
        self.endpoint.transport().delete(&url, Body::Json(body))?;
        Ok(())
    }

    pub fn approve_delegation(&self, domain_id: u64, org_id: u64) -> Result<()> {
        let url = self
            .endpoint
            .url(&[&domain_id.to_string(), "delegation", "approve"]);
        self.endpoint
            .transport()
            .post(&url, Body::Json(json!({"orgId": org_id})))?;
        Ok(())
    }

    pub fn reject_delegation(&self, domain_id: u64, org_id: u64) -> Result<()> {
        let url = self
            .endpoint
            .url(&[&domain_id.to_string(), "delegation", "reject"]);
        self.endpoint
            .transport()
            .post(&url, Body::Json(json!({"orgId": org_id})))?;
        Ok(())
    }
}
