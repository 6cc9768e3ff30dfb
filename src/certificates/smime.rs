use std::sync::Arc;

use log::{debug, info};
use serde_json::{Value, json};

use super::{
    CertFormat, CertificateBase, CertificateFilter, Certificates, Collected, CustomField,
    validate_reason,
};
use crate::endpoint::{Endpoint, encode_segment};
use crate::error::{Error, Result};
use crate::paginate::{PageRequest, paginate};
use crate::transport::{Body, Transport};

/// Error code the collect endpoint answers with while the order is processed.
pub const PENDING_CODE: i64 = -183;
/// Error code the collect endpoint answers with once the certificate is revoked.
pub const REVOKED_CODE: i64 = -192;

/// API version hosting the e-mail lookup and replacement operations.
const NEWER_VERSION: &str = "v2";

/// Client (S/MIME) certificates (`/smime`).
pub struct Smime {
    base: CertificateBase,
}

/// Parameters for [`Smime::enroll`].
#[derive(Debug, Clone, Default)]
pub struct SmimeEnrollment {
    pub cert_type_name: String,
    pub csr: String,
    pub term: i64,
    pub org_id: u64,
    pub email: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub phone: Option<String>,
    pub secondary_emails: Vec<String>,
    pub common_name: Option<String>,
    pub eppn: Option<String>,
    pub custom_fields: Vec<CustomField>,
}

/// Parameters for [`Smime::replace`].
#[derive(Debug, Clone)]
pub struct SmimeReplacement {
    pub csr: String,
    pub reason: String,
    /// Revoke the certificate being replaced. Defaults to `true`.
    pub revoke_previous: bool,
}

impl SmimeReplacement {
    pub fn new(csr: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            csr: csr.into(),
            reason: reason.into(),
            revoke_previous: true,
        }
    }
}

impl Smime {
    pub const SERVICE: &'static str = "/smime";

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

    /// Lazily walks every S/MIME certificate matching `filter`.
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

    /// Certificates issued to `email`.
    pub fn list_by_email(&self, email: &str) -> Result<Vec<Value>> {
        if email.is_empty() {
            return Err(Error::validation("email must not be empty"));
        }
        self.endpoint().with_api_version(NEWER_VERSION, |endpoint| {
            let url = endpoint.url(&["byPersonEmail", &encode_segment(email)]);
            endpoint.transport().get(&url, Vec::new())?.json()
        })
    }

    /// Revokes every certificate issued to `email`.
    pub fn revoke_by_email(&self, email: &str, reason: &str) -> Result<()> {
        if email.is_empty() {
            return Err(Error::validation("email must not be empty"));
        }
        validate_reason(reason)?;
        let url = self.endpoint().url(&["revoke"]);
        self.endpoint().transport().post(
            &url,
            Body::Json(json!({ "email": email, "reason": reason })),
        )?;
        info!("[smime] revoked all certificates of {email}");
        Ok(())
    }
}

impl Certificates for Smime {
    type Enrollment = SmimeEnrollment;
    type Replacement = SmimeReplacement;

    fn base(&self) -> &CertificateBase {
        &self.base
    }

    fn enroll(&self, request: &SmimeEnrollment) -> Result<Value> {
        let type_id = self.base.resolve_type(&request.cert_type_name, request.term)?;
        self.base.validate_custom_fields(&request.custom_fields)?;

        let mut body = json!({
            "orgId": request.org_id,
            "csr": request.csr.trim_end(),
            "certType": type_id,
            "term": request.term,
            "email": request.email,
            "firstName": request.first_name,
            "middleName": request.middle_name,
            "lastName": request.last_name,
            "phone": request.phone,
            "secondaryEmails": request.secondary_emails,
            "commonName": request.common_name,
            "eppn": request.eppn,
        });
        if !request.custom_fields.is_empty() {
            body["customFields"] = serde_json::to_value(&request.custom_fields)?;
        }

        let url = self.endpoint().url(&["/enroll"]);
        let result: Value = self.endpoint().transport().post(&url, Body::Json(body))?.json()?;
        info!("[smime] enrolled {} for {}", request.cert_type_name, request.email);
        Ok(result)
    }

    /// Reads the error code the server attaches to unavailable certificates;
    /// codes other than the pending and revoked ones come back as the
    /// original error.
    fn collect(&self, cert_id: u64, format: CertFormat) -> Result<Collected> {
        let url = self.endpoint().url(&["collect", &cert_id.to_string()]);
        let params = vec![("format".to_string(), format.as_str().to_string())];
        match self.endpoint().transport().get(&url, params) {
            Ok(response) => Ok(Collected::issued(format, response)),
            Err(Error::Http(err)) => match err.body().and_then(|body| body.code) {
                Some(PENDING_CODE) => {
                    debug!("[smime] certificate {cert_id} still pending");
                    Ok(Collected::Pending {
                        status: Some(err.status()),
                    })
                }
                Some(REVOKED_CODE) => {
                    debug!("[smime] certificate {cert_id} is revoked");
                    Ok(Collected::Revoked)
                }
                _ => Err(Error::Http(err)),
            },
            Err(err) => Err(err),
        }
    }

    fn renew(&self, cert_id: u64) -> Result<Value> {
        let url = self.endpoint().url(&["renew", "order", &cert_id.to_string()]);
        self.endpoint().transport().post(&url, Body::Empty)?.json()
    }

    fn replace(&self, cert_id: u64, request: &SmimeReplacement) -> Result<()> {
        let body = json!({
            "csr": request.csr,
            "reason": request.reason,
            "revoke": request.revoke_previous,
        });
        self.endpoint().with_api_version(NEWER_VERSION, |endpoint| {
            let url = endpoint.url(&["replace", "order", &cert_id.to_string()]);
            endpoint.transport().post(&url, Body::Json(body))?;
            Ok(())
        })
    }

    fn revoke(&self, cert_id: u64, reason: &str) -> Result<()> {
        validate_reason(reason)?;
        let url = self.endpoint().url(&["revoke", "order", &cert_id.to_string()]);
        self.endpoint()
            .transport()
            .post(&url, Body::Json(json!({ "reason": reason })))?;
        info!("[smime] revoked certificate {cert_id}");
        Ok(())
    }
}
