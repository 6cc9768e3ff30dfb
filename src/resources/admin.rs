use std::sync::Arc;

use log::info;
use serde::Serialize;
use serde_json::{Map, Value};

use super::request_body;
use crate::cache::Cached;
use crate::creation::{CreatedResource, create, server_validation};
use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::transport::{Body, Transport};

/// Administrator accounts (`/admin`).
pub struct Admin {
    endpoint: Endpoint,
    admins: Cached<Vec<Value>>,
}

/// A new administrator. Privileges, `identityProviderId` and similar
/// documented keys go in `extra`.
#[derive(Debug, Clone, Serialize)]
pub struct NewAdmin {
    pub login: String,
    pub email: String,
    pub forename: String,
    pub surname: String,
    pub password: String,
    pub credentials: Vec<Value>,
    #[serde(skip)]
    pub extra: Map<String, Value>,
}

impl Admin {
    pub const SERVICE: &'static str = "/admin";

    /// Builds the resource and loads the administrator list right away.
    pub fn new(transport: Arc<dyn Transport>, base_url: &str) -> Result<Self> {
        Self::with_api_version(transport, base_url, "v1")
    }

    pub fn with_api_version(
        transport: Arc<dyn Transport>,
        base_url: &str,
        version: &str,
    ) -> Result<Self> {
        let admin = Self {
            endpoint: Endpoint::new(transport, base_url, Self::SERVICE, version),
            admins: Cached::new("admins"),
        };
        admin.all(false)?;
        Ok(admin)
    }

    pub fn all(&self, force: bool) -> Result<Vec<Value>> {
        self.admins.get_or_fetch(force, || {
            self.endpoint
                .transport()
                .get(self.endpoint.api_url(), Vec::new())?
                .json()
        })
    }

    pub fn create(&self, admin: &NewAdmin) -> Result<CreatedResource> {
        let body = request_body(admin, &admin.extra)?;
        let created = create(self.endpoint.transport(), self.endpoint.api_url(), body, "Admin")?;
        self.admins.invalidate();
        Ok(created)
    }

    pub fn get(&self, admin_id: u64) -> Result<Value> {
        let url = self.endpoint.url(&[&admin_id.to_string()]);
        self.endpoint.transport().get(&url, Vec::new())?.json()
    }

    /// Identity providers configured for the account.
    pub fn get_idps(&self) -> Result<Vec<Value>> {
        let url = self.endpoint.url(&["idp"]);
        self.endpoint.transport().get(&url, Vec::new())?.json()
    }

    pub fn update(&self, admin_id: u64, fields: &Map<String, Value>) -> Result<()> {
        let url = self.endpoint.url(&[&admin_id.to_string()]);
        self.endpoint
            .transport()
            .put(&url, Body::Json(Value::Object(fields.clone())))
            .map_err(server_validation)?;
        info!("[admin] updated admin {admin_id}");
        Ok(())
    }

    pub fn delete(&self, admin_id: u64) -> Result<()> {
        let url = self.endpoint.url(&[&admin_id.to_string()]);
        self.endpoint.transport().delete(&url, Body::Empty)?;
        self.admins.invalidate();
        info!("[admin] deleted admin {admin_id}");
        Ok(())
    }
}
