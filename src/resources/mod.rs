//! Account-level resources: administrators, domains, organizations, ACME
//! accounts, persons, domain control validation and reports.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::creation::merge_extra;
use crate::error::Result;

mod acme;
mod admin;
mod dcv;
mod domain;
mod organization;
mod person;
mod report;

pub use acme::{AcmeAccount, AcmeQuery, NewAcmeAccount};
pub use admin::{Admin, NewAdmin};
pub use dcv::DomainControlValidation;
pub use domain::{Domain, NewDomain};
pub use organization::Organization;
pub use person::{Person, PersonDetails};
pub use report::{Report, ReportFilter};

/// Serializes a request struct and appends its passthrough fields.
pub(crate) fn request_body<T: Serialize>(fields: &T, extra: &Map<String, Value>) -> Result<Value> {
    let mut body = serde_json::to_value(fields)?;
    merge_extra(&mut body, extra)?;
    Ok(body)
}
