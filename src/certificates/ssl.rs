use std::sync::Arc;

use log::{debug, info};
use serde_json::{Value, json};

use super::{
    CertFormat, CertificateBase, CertificateFilter, Certificates, Collected, CustomField,
    comma_joined, validate_reason,
};
use crate::config::user_agent;
use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::paginate::{PageRequest, paginate};
use crate::transport::{Body, Transport};

/// SSL/TLS server certificates (`/ssl`).
pub struct Ssl {
    base: CertificateBase,
}

/// Parameters for [`Ssl::enroll`].
#[derive(Debug, Clone)]
pub struct SslEnrollment {
    /// Must match a name from [`Certificates::types`].
    pub cert_type_name: String,
    pub csr: String,
    /// Validity in days; must be one of the type's terms.
    pub term: i64,
    pub org_id: u64,
    pub subject_alt_names: Vec<String>,
    /// E-mail addresses notified about the certificate.
    pub external_requester: Vec<String>,
    pub custom_fields: Vec<CustomField>,
}

impl SslEnrollment {
    pub fn new(
        cert_type_name: impl Into<String>,
        csr: impl Into<String>,
        term: i64,
        org_id: u64,
    ) -> Self {
        Self {
            cert_type_name: cert_type_name.into(),
            csr: csr.into(),
            term,
            org_id,
            subject_alt_names: Vec::new(),
            external_requester: Vec::new(),
            custom_fields: Vec::new(),
        }
    }
}

/// Parameters for [`Ssl::replace`].
#[derive(Debug, Clone)]
pub struct SslReplacement {
    pub csr: String,
    pub common_name: String,
    /// Up to 512 characters; may be empty.
    pub reason: String,
    pub subject_alt_names: Vec<String>,
}

impl Ssl {
    pub const SERVICE: &'static str = "/ssl";

    pub fn new(transport: Arc<dyn Transport>, base_url: &str) -> Self {
        Self::with_api_version(transport, base_url, "v1")
    }

    pub fn with_api_version(transport: Arc<dyn Transport>, base_url: &str, version: &str) -> Self {
        Self {
            base: CertificateBase::new(transport, base_url, Self::SERVICE, version),
        }
    }

    fn endpoint(&self) -> &Endpoint {
        self.base.endpoint()
    }

    /// Lazily walks every certificate matching `filter`.
    pub fn list<'a>(
        &'a self,
        filter: &'a CertificateFilter,
        start: PageRequest,
    ) -> impl Iterator<Item = Result<Value>> + 'a {
        paginate(start, move |page| {
            let mut params = page.params();
            params.extend(filter.params());
            self.endpoint()
                .transport()
                .get(self.endpoint().api_url(), params)?
                .json::<Vec<Value>>()
        })
    }

    pub fn get(&self, cert_id: u64) -> Result<Value> {
        let url = self.endpoint().url(&[&cert_id.to_string()]);
        self.endpoint().transport().get(&url, Vec::new())?.json()
    }

    pub fn count(&self, filter: &CertificateFilter) -> Result<Value> {
        let url = self.endpoint().url(&["/count"]);
        self.endpoint().transport().get(&url, filter.params())?.json()
    }
}

impl Certificates for Ssl {
    type Enrollment = SslEnrollment;
    type Replacement = SslReplacement;

    fn base(&self) -> &CertificateBase {
        &self.base
    }

    fn enroll(&self, request: &SslEnrollment) -> Result<Value> {
        let type_id = self.base.resolve_type(&request.cert_type_name, request.term)?;
        self.base.validate_custom_fields(&request.custom_fields)?;

        let mut body = json!({
            "orgId": request.org_id,
            "csr": request.csr.trim_end(),
            "subjAltNames": comma_joined(&request.subject_alt_names),
            "certType": type_id,
            "numberServers": 1,
            "serverType": -1,
            "term": request.term,
            "comments": format!("Enrolled by {}", user_agent()),
            "externalRequester": comma_joined(&request.external_requester),
        });
        if !request.custom_fields.is_empty() {
            body["customFields"] = serde_json::to_value(&request.custom_fields)?;
        }

        let url = self.endpoint().url(&["/enroll"]);
        let result: Value = self.endpoint().transport().post(&url, Body::Json(body))?.json()?;
        info!(
            "[ssl] enrolled {} for org {}",
            request.cert_type_name, request.org_id
        );
        Ok(result)
    }

    /// Any HTTP error from the collect endpoint means "not issued yet"; the
    /// status is kept on [`Collected::Pending`] because a 404 or 500 looks
    /// exactly the same here.
    fn collect(&self, cert_id: u64, format: CertFormat) -> Result<Collected> {
        let url = self
            .endpoint()
            .url(&["collect", &cert_id.to_string(), format.as_str()]);
        match self.endpoint().transport().get(&url, Vec::new()) {
            Ok(response) => Ok(Collected::issued(format, response)),
            Err(Error::Http(err)) => {
                debug!(
                    "[ssl] certificate {cert_id} still pending (HTTP {})",
                    err.status()
                );
                Ok(Collected::Pending {
                    status: Some(err.status()),
                })
            }
            Err(err) => Err(err),
        }
    }

    fn renew(&self, cert_id: u64) -> Result<Value> {
        let url = self.endpoint().url(&["renewById", &cert_id.to_string()]);
        self.endpoint().transport().post(&url, Body::Empty)?.json()
    }

    fn replace(&self, cert_id: u64, request: &SslReplacement) -> Result<()> {
        let url = self.endpoint().url(&["replace", &cert_id.to_string()]);
        let body = json!({
            "csr": request.csr,
            "commonName": request.common_name,
            "subjectAlternativeNames": comma_joined(&request.subject_alt_names),
            "reason": request.reason,
        });
        self.endpoint().transport().post(&url, Body::Json(body))?;
        Ok(())
    }

    fn revoke(&self, cert_id: u64, reason: &str) -> Result<()> {
        validate_reason(reason)?;
        let url = self.endpoint().url(&["revoke", &cert_id.to_string()]);
        self.endpoint()
            .transport()
            .post(&url, Body::Json(json!({ "reason": reason })))?;
        info!("[ssl] revoked certificate {cert_id}");
        Ok(())
    }
}
