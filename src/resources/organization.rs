use std::sync::Arc;

use serde_json::Value;

use crate::cache::Cached;
use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::transport::Transport;

/// Organizations and their departments (`/organization`).
pub struct Organization {
    endpoint: Endpoint,
    orgs: Cached<Vec<Value>>,
}

impl Organization {
    pub const SERVICE: &'static str = "/organization";

    /// Builds the resource and loads the organization list right away.
    pub fn new(transport: Arc<dyn Transport>, base_url: &str) -> Result<Self> {
        Self::with_api_version(transport, base_url, "v1")
    }

    pub fn with_api_version(
        transport: Arc<dyn Transport>,
        base_url: &str,
        version: &str,
    ) -> Result<Self> {
        let org = Self {
            endpoint: Endpoint::new(transport, base_url, Self::SERVICE, version),
            orgs: Cached::new("organizations"),
        };
        org.all(false)?;
        Ok(org)
    }

    pub fn all(&self, force: bool) -> Result<Vec<Value>> {
        self.orgs.get_or_fetch(force, || {
            self.endpoint
                .transport()
                .get(self.endpoint.api_url(), Vec::new())?
                .json()
        })
    }

    /// Searches the cached organizations.
    ///
    /// With only `org_name`, returns the matching organizations. With a
    /// `dept_name`, returns matching departments, limited to the named
    /// organization when both are given. With neither, returns everything.
    pub fn find(&self, org_name: Option<&str>, dept_name: Option<&str>) -> Result<Vec<Value>> {
        let orgs = self.all(false)?;

        let orgs: Vec<Value> = match org_name {
            Some(name) => orgs
                .into_iter()
                .filter(|org| org["name"].as_str() == Some(name))
                .collect(),
            None => orgs,
        };

        let Some(dept_name) = dept_name else {
            return Ok(orgs);
        };
        Ok(orgs
            .iter()
            .filter_map(|org| org.get("departments").and_then(Value::as_array))
            .flatten()
            .filter(|dept| dept["name"].as_str() == Some(dept_name))
            .cloned()
            .collect())
    }
}
