use std::collections::BTreeMap;
use std::sync::Arc;

use log::info;

use crate::certificates::{Smime, Ssl};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::resources::{
    AcmeAccount, Admin, Domain, DomainControlValidation, Organization, Person, Report,
};
use crate::transport::{HttpTransport, LoggingTransport, Transport};

/// Entry point: owns the authenticated session and hands out resources.
///
/// Every resource created from one client shares its transport, but each keeps
/// its own caches.
pub struct Client {
    base_url: String,
    transport: Arc<dyn Transport>,
    session: Option<Arc<HttpTransport>>,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let session = Arc::new(HttpTransport::new(&config)?);
        let transport: Arc<dyn Transport> = Arc::new(LoggingTransport::new(session.clone()));
        info!(
            "[client] session for {} at {}",
            config.username, config.base_url
        );
        Ok(Self {
            base_url: config.base_url,
            transport,
            session: Some(session),
        })
    }

    /// Uses a caller-supplied transport instead of the HTTP session.
    pub fn with_transport(base_url: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
            session: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> Arc<dyn Transport> {
        self.transport.clone()
    }

    /// Headers sent with every request.
    pub fn headers(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.session()?.headers())
    }

    pub fn add_headers<I, K, V>(&self, headers: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.session()?.add_headers(headers);
        Ok(())
    }

    pub fn remove_headers<I, K>(&self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        self.session()?.remove_headers(names);
        Ok(())
    }

    fn session(&self) -> Result<&HttpTransport> {
        self.session
            .as_deref()
            .ok_or_else(|| Error::config("headers are managed by the custom transport"))
    }

    pub fn ssl(&self) -> Ssl {
        Ssl::new(self.transport(), &self.base_url)
    }

    pub fn smime(&self) -> Smime {
        Smime::new(self.transport(), &self.base_url)
    }

    /// Loads the administrator list before returning.
    pub fn admin(&self) -> Result<Admin> {
        Admin::new(self.transport(), &self.base_url)
    }

    /// Loads the organization list before returning.
    pub fn organization(&self) -> Result<Organization> {
        Organization::new(self.transport(), &self.base_url)
    }

    pub fn domain(&self) -> Domain {
        Domain::new(self.transport(), &self.base_url)
    }

    pub fn acme(&self) -> AcmeAccount {
        AcmeAccount::new(self.transport(), &self.base_url)
    }

    pub fn person(&self) -> Person {
        Person::new(self.transport(), &self.base_url)
    }

    pub fn dcv(&self) -> DomainControlValidation {
        DomainControlValidation::new(self.transport(), &self.base_url)
    }

    pub fn report(&self) -> Report {
        Report::new(self.transport(), &self.base_url)
    }
}
