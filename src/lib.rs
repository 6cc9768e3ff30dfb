//! Blocking client for the Sectigo Certificate Manager REST API.
//!
//! ```no_run
//! use cert_manager::{Certificates, CertFormat, Client, ClientConfig, Collected};
//!
//! # fn main() -> cert_manager::Result<()> {
//! let client = Client::new(ClientConfig::from_env()?)?;
//! let ssl = client.ssl();
//! match ssl.collect(1234, CertFormat::Pem)? {
//!     Collected::Ready(pem) => println!("{pem}"),
//!     Collected::Binary(der) => println!("{} bytes", der.len()),
//!     Collected::Pending { .. } => println!("not issued yet"),
//!     Collected::Revoked => println!("revoked"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod certificates;
pub mod client;
pub mod config;
pub mod creation;
pub mod endpoint;
pub mod error;
pub mod paginate;
pub mod resources;
pub mod transport;

#[cfg(test)]
mod testing;

pub use certificates::{
    CertFormat, Certificates, Collected, CustomField, CustomFieldDefinition, Smime,
    SmimeEnrollment, SmimeReplacement, Ssl, SslEnrollment, SslReplacement,
};
pub use client::Client;
pub use config::{Auth, ClientConfig};
pub use creation::CreatedResource;
pub use endpoint::Endpoint;
pub use error::{CreationError, Error, ErrorBody, HttpError, Result};
pub use paginate::{PageRequest, Pages};
pub use resources::{
    AcmeAccount, AcmeQuery, Admin, Domain, DomainControlValidation, NewAcmeAccount, NewAdmin,
    NewDomain, Organization, Person, PersonDetails, Report, ReportFilter,
};
pub use transport::{Body, Method, Request, Response, Transport};
