//! Certificate lifecycle shared by the SSL and S/MIME resources.
//!
//! The server owns the lifecycle (requested, issued, revoked, replaced, ...);
//! the client only issues the calls and interprets what comes back. Both kinds
//! expose the same operation names through [`Certificates`], but each brings
//! its own enrollment and replacement payloads because the wire formats differ.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use log::debug;
use serde::Deserialize;
use serde_json::Value;

use crate::cache::Cached;
use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::transport::{Params, Response, Transport};

mod custom_fields;
mod smime;
mod ssl;

pub use custom_fields::{
    CustomField, CustomFieldDefinition, custom_fields_from_json, validate_custom_fields,
};
pub use smime::{PENDING_CODE, REVOKED_CODE, Smime, SmimeEnrollment, SmimeReplacement};
pub use ssl::{Ssl, SslEnrollment, SslReplacement};

/// Longest revocation reason the server accepts.
pub const MAX_REASON_LEN: usize = 511;

/// Formats a certificate can be collected in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CertFormat {
    /// X509, Base64 encoded
    X509,
    /// X509 certificate only, Base64 encoded
    X509CertOnly,
    /// X509 intermediates/root only, Base64 encoded
    X509IntermediatesOnly,
    /// PKCS#7, Base64 encoded
    Base64,
    /// PKCS#7, binary; collected as [`Collected::Binary`]
    Bin,
    /// X509 intermediates/root only, reversed, Base64 encoded
    X509IntermediatesReversed,
    /// Certificate with chain, PEM encoded
    Pem,
    /// Certificate only, PEM encoded
    PemCertOnly,
    /// Certificate with issuer after, PEM encoded
    PemIssuerAfter,
}

impl CertFormat {
    pub const ALL: [CertFormat; 9] = [
        CertFormat::X509,
        CertFormat::X509CertOnly,
        CertFormat::X509IntermediatesOnly,
        CertFormat::Base64,
        CertFormat::Bin,
        CertFormat::X509IntermediatesReversed,
        CertFormat::Pem,
        CertFormat::PemCertOnly,
        CertFormat::PemIssuerAfter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CertFormat::X509 => "x509",
            CertFormat::X509CertOnly => "x509CO",
            CertFormat::X509IntermediatesOnly => "x509IO",
            CertFormat::Base64 => "base64",
            CertFormat::Bin => "bin",
            CertFormat::X509IntermediatesReversed => "x509IOR",
            CertFormat::Pem => "pem",
            CertFormat::PemCertOnly => "pemco",
            CertFormat::PemIssuerAfter => "pemia",
        }
    }
}

impl FromStr for CertFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        CertFormat::ALL
            .into_iter()
            .find(|format| format.as_str() == s)
            .ok_or_else(|| Error::validation(format!("invalid cert format {s} provided")))
    }
}

impl fmt::Display for CertFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the certificate type catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateType {
    pub id: i64,
    pub terms: Vec<i64>,
}

/// Certificate types keyed by their display name.
pub type TypeCatalog = HashMap<String, CertificateType>;

#[derive(Deserialize)]
struct CertificateTypeEntry {
    id: i64,
    name: String,
    #[serde(default)]
    terms: Vec<i64>,
}

/// Outcome of a collection attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Collected {
    /// The certificate body, decoded with the charset the server declared.
    Ready(String),
    /// Undecoded certificate bytes, for [`CertFormat::Bin`].
    Binary(Vec<u8>),
    /// Not issued yet; poll again later. `status` is the HTTP status the
    /// server answered with, so callers can tell a genuine pending state from
    /// an endpoint that only failed.
    Pending { status: Option<u16> },
    /// The certificate has been revoked and will never be collectable.
    Revoked,
}

impl Collected {
    fn issued(format: CertFormat, response: Response) -> Self {
        match format {
            CertFormat::Bin => Collected::Binary(response.into_bytes()),
            _ => Collected::Ready(response.text),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Collected::Ready(_) | Collected::Binary(_))
    }

    pub fn into_ready(self) -> Option<String> {
        match self {
            Collected::Ready(body) => Some(body),
            _ => None,
        }
    }
}

/// Filters for certificate listings. Unset fields are not sent.
#[derive(Debug, Clone, Default)]
pub struct CertificateFilter {
    pub common_name: Option<String>,
    pub status: Option<String>,
    pub org_id: Option<u64>,
    pub serial_number: Option<String>,
    pub email: Option<String>,
    /// Any other documented search keys, sent verbatim.
    pub other: Params,
}

impl CertificateFilter {
    pub fn params(&self) -> Params {
        let mut params = crate::transport::params([
            ("commonName", self.common_name.clone()),
            ("status", self.status.clone()),
            ("orgId", self.org_id.map(|id| id.to_string())),
            ("serialNumber", self.serial_number.clone()),
            ("email", self.email.clone()),
        ]);
        params.extend(self.other.iter().cloned());
        params
    }
}

/// State and helpers common to every certificate resource.
pub struct CertificateBase {
    endpoint: Endpoint,
    types: Cached<TypeCatalog>,
    custom_fields: Cached<Vec<CustomFieldDefinition>>,
}

impl CertificateBase {
    pub fn new(transport: Arc<dyn Transport>, base_url: &str, service: &str, version: &str) -> Self {
        Self {
            endpoint: Endpoint::new(transport, base_url, service, version),
            types: Cached::new("certificate types"),
            custom_fields: Cached::new("custom fields"),
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn types(&self, force: bool) -> Result<TypeCatalog> {
        self.types.get_or_fetch(force, || {
            let url = self.endpoint.url(&["/types"]);
            let entries: Vec<CertificateTypeEntry> =
                self.endpoint.transport().get(&url, Vec::new())?.json()?;
            debug!("[certificates] {} certificate type(s) at {url}", entries.len());
            Ok(entries
                .into_iter()
                .map(|entry| {
                    (
                        entry.name,
                        CertificateType {
                            id: entry.id,
                            terms: entry.terms,
                        },
                    )
                })
                .collect())
        })
    }

    pub fn custom_fields(&self, force: bool) -> Result<Vec<CustomFieldDefinition>> {
        self.custom_fields.get_or_fetch(force, || {
            let url = self.endpoint.url(&["/customFields"]);
            self.endpoint.transport().get(&url, Vec::new())?.json()
        })
    }

    /// Resolves a type name and term to the type id, failing locally when
    /// either is not offered.
    pub fn resolve_type(&self, type_name: &str, term: i64) -> Result<i64> {
        let types = self.types(false)?;
        let cert_type = types.get(type_name).ok_or_else(|| {
            Error::validation(format!("incorrect certificate type specified: '{type_name}'"))
        })?;
        if !cert_type.terms.contains(&term) {
            let valid: Vec<String> = cert_type.terms.iter().map(i64::to_string).collect();
            return Err(Error::validation(format!(
                "incorrect term specified: {term}. Valid terms are {}.",
                valid.join(", ")
            )));
        }
        Ok(cert_type.id)
    }

    /// Even an empty list needs the schema: mandatory fields may be missing.
    pub fn validate_custom_fields(&self, fields: &[CustomField]) -> Result<()> {
        validate_custom_fields(&self.custom_fields(false)?, fields)
    }
}

/// Rejects revocation reasons the server would refuse.
pub fn validate_reason(reason: &str) -> Result<()> {
    let len = reason.chars().count();
    if len == 0 || len > MAX_REASON_LEN {
        return Err(Error::validation(format!(
            "reason must be between 1 and {MAX_REASON_LEN} characters, got {len}"
        )));
    }
    Ok(())
}

/// Operations every certificate resource supports.
pub trait Certificates {
    type Enrollment;
    type Replacement;

    fn base(&self) -> &CertificateBase;

    /// Certificate types available to the account, cached after the first call.
    fn types(&self) -> Result<TypeCatalog> {
        self.base().types(false)
    }

    fn refresh_types(&self) -> Result<TypeCatalog> {
        self.base().types(true)
    }

    /// Custom fields declared for the account, cached after the first call.
    fn custom_fields(&self) -> Result<Vec<CustomFieldDefinition>> {
        self.base().custom_fields(false)
    }

    fn refresh_custom_fields(&self) -> Result<Vec<CustomFieldDefinition>> {
        self.base().custom_fields(true)
    }

    /// Submits an enrollment and returns the server's JSON answer.
    fn enroll(&self, request: &Self::Enrollment) -> Result<Value>;

    fn collect(&self, cert_id: u64, format: CertFormat) -> Result<Collected>;

    fn renew(&self, cert_id: u64) -> Result<Value>;

    fn replace(&self, cert_id: u64, request: &Self::Replacement) -> Result<()>;

    fn revoke(&self, cert_id: u64, reason: &str) -> Result<()>;
}

/// Joins list values the way the API expects them (comma separated).
pub(crate) fn comma_joined(values: &[String]) -> Option<String> {
    if values.is_empty() {
        None
    } else {
        Some(values.join(","))
    }
}
