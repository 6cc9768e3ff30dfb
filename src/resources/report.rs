use std::sync::Arc;

use chrono::NaiveDate;
use log::debug;
use serde::Serialize;
use serde_json::{Map, Value};

use super::request_body;
use crate::creation::server_validation;
use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::transport::{Body, Transport};

/// Account reports (`/report`).
pub struct Report {
    endpoint: Endpoint,
}

/// Report criteria. Dates are sent as `YYYY-MM-DD`; report-specific keys
/// such as `certificateStatus` go in `extra`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub organization_ids: Vec<u64>,
    #[serde(skip)]
    pub extra: Map<String, Value>,
}

impl ReportFilter {
    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            ..Default::default()
        }
    }
}

impl Report {
    pub const SERVICE: &'static str = "/report";

    pub fn new(transport: Arc<dyn Transport>, base_url: &str) -> Self {
        Self::with_api_version(transport, base_url, "v1")
    }

    pub fn with_api_version(transport: Arc<dyn Transport>, base_url: &str, version: &str) -> Self {
        Self {
            endpoint: Endpoint::new(transport, base_url, Self::SERVICE, version),
        }
    }

    /// Runs the named report. Names may contain sub paths, e.g. `discovery/log`.
    pub fn get(&self, report_name: &str, filter: &ReportFilter) -> Result<Value> {
        let parts: Vec<&str> = report_name.split('/').collect();
        let url = self.endpoint.url(&parts);
        let body = request_body(filter, &filter.extra)?;
        debug!("[report] requesting {report_name}");
        self.endpoint
            .transport()
            .post(&url, Body::Json(body))
            .map_err(server_validation)?
            .json()
    }

    pub fn ssl_certificates(&self, filter: &ReportFilter) -> Result<Value> {
        self.get("ssl-certificates", filter)
    }

    pub fn client_certificates(&self, filter: &ReportFilter) -> Result<Value> {
        self.get("client-certificates", filter)
    }

    pub fn device_certificates(&self, filter: &ReportFilter) -> Result<Value> {
        self.get("device-certificates", filter)
    }

    pub fn activity(&self, filter: &ReportFilter) -> Result<Value> {
        self.get("activity", filter)
    }

    pub fn domains(&self) -> Result<Value> {
        self.get("domains", &ReportFilter::default())
    }
}
