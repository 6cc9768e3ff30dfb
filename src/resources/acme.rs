use std::sync::{Arc, Mutex};

use log::{debug, info};
use serde::Serialize;
use serde_json::{Map, Value, json};

use super::request_body;
use crate::cache::Cached;
use crate::creation::{CreatedResource, create};
use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::paginate::{PageRequest, paginate};
use crate::transport::{Body, Params, Transport, params};

/// ACME accounts (`/acme/v1/account`).
pub struct AcmeAccount {
    endpoint: Endpoint,
    accounts: Cached<Vec<Value>>,
    cached_org: Mutex<Option<u64>>,
}

/// Search keys for [`AcmeAccount::find`]. Unset keys are not sent.
#[derive(Debug, Clone, Default)]
pub struct AcmeQuery {
    pub org_id: u64,
    pub name: Option<String>,
    pub acme_server: Option<String>,
    pub cert_validation_type: Option<String>,
    pub status: Option<String>,
}

impl AcmeQuery {
    pub fn for_org(org_id: u64) -> Self {
        Self {
            org_id,
            ..Default::default()
        }
    }

    pub fn params(&self) -> Params {
        params([
            ("organizationId", Some(self.org_id.to_string())),
            ("name", self.name.clone()),
            ("acmeServer", self.acme_server.clone()),
            ("certValidationType", self.cert_validation_type.clone()),
            ("status", self.status.clone()),
        ])
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAcmeAccount {
    pub name: String,
    pub acme_server: String,
    #[serde(rename = "organizationId")]
    pub org_id: u64,
    /// Extended-validation details; sent as `{}` when empty.
    pub ev_details: Map<String, Value>,
    #[serde(skip)]
    pub extra: Map<String, Value>,
}

impl AcmeAccount {
    pub const SERVICE: &'static str = "/acme";

    pub fn new(transport: Arc<dyn Transport>, base_url: &str) -> Self {
        Self::with_api_version(transport, base_url, "v1")
    }

    pub fn with_api_version(transport: Arc<dyn Transport>, base_url: &str, version: &str) -> Self {
        Self {
            endpoint: Endpoint::new(transport, base_url, Self::SERVICE, version).nested("/account"),
            accounts: Cached::new("acme accounts"),
            cached_org: Mutex::new(None),
        }
    }

    /// Every account of `org_id`. The cache holds one organization at a time;
    /// asking for another one refetches.
    pub fn all(&self, org_id: u64, force: bool) -> Result<Vec<Value>> {
        let mut cached_org = self
            .cached_org
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let switched = *cached_org != Some(org_id);
        if switched {
            debug!("[acme] account cache switches to organization {org_id}");
        }

        let accounts = self.accounts.get_or_fetch(force || switched, || {
            self.find(&AcmeQuery::for_org(org_id), PageRequest::default())
                .collect()
        })?;
        *cached_org = Some(org_id);
        Ok(accounts)
    }

    pub fn find<'a>(
        &'a self,
        query: &'a AcmeQuery,
        start: PageRequest,
    ) -> impl Iterator<Item = Result<Value>> + 'a {
        let query = query.params();
        paginate(start, move |page| {
            let mut params = page.params();
            params.extend(query.iter().cloned());
            self.endpoint
                .transport()
                .get(self.endpoint.api_url(), params)?
                .json::<Vec<Value>>()
        })
    }

    pub fn get(&self, acme_id: u64) -> Result<Value> {
        let url = self.endpoint.url(&[&acme_id.to_string()]);
        self.endpoint.transport().get(&url, Vec::new())?.json()
    }

    pub fn create(&self, account: &NewAcmeAccount) -> Result<CreatedResource> {
        let body = request_body(account, &account.extra)?;
        let created = create(
            self.endpoint.transport(),
            self.endpoint.api_url(),
            body,
            "ACME Account",
        )?;
        self.accounts.invalidate();
        Ok(created)
    }

    pub fn update(&self, acme_id: u64, name: &str) -> Result<()> {
        let url = self.endpoint.url(&[&acme_id.to_string()]);
        self.endpoint
            .transport()
            .put(&url, Body::Json(json!({ "name": name })))?;
        Ok(())
    }

    pub fn delete(&self, acme_id: u64) -> Result<()> {
        let url = self.endpoint.url(&[&acme_id.to_string()]);
        self.endpoint.transport().delete(&url, Body::Empty)?;
        self.accounts.invalidate();
        info!("[acme] deleted account {acme_id}");
        Ok(())
    }

    pub fn add_domains(&self, acme_id: u64, domains: &[String]) -> Result<Value> {
        let url = self.endpoint.url(&[&acme_id.to_string(), "domains"]);
        self.endpoint
            .transport()
            .post(&url, Body::Json(domain_list(domains)))?
            .json()
    }

    pub fn remove_domains(&self, acme_id: u64, domains: &[String]) -> Result<Value> {
        let url = self.endpoint.url(&[&acme_id.to_string(), "domains"]);
        self.endpoint
            .transport()
            .delete(&url, Body::Json(domain_list(domains)))?
            .json()
    }
}

fn domain_list(domains: &[String]) -> Value {
    let entries: Vec<Value> = domains.iter().map(|name| json!({ "name": name })).collect();
    json!({ "domains": entries })
}
