use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use log::warn;
use zeroize::Zeroizing;

use crate::error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://cert-manager.com/api";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// How the client proves who it is.
#[derive(Clone)]
pub enum Auth {
    /// Sent as the `password` header on every request.
    Password(Zeroizing<String>),
    /// Mutual TLS with a PEM certificate and PKCS#8 key.
    Certificate { cert_file: PathBuf, key_file: PathBuf },
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Auth::Password(_) => f.write_str("Password(<redacted>)"),
            Auth::Certificate {
                cert_file,
                key_file,
            } => f
                .debug_struct("Certificate")
                .field("cert_file", cert_file)
                .field("key_file", key_file)
                .finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root, e.g. `https://cert-manager.com/api`.
    pub base_url: String,
    /// Customer URI: for `https://cert-manager.com/customer/foo/` this is `foo`.
    pub login_uri: String,
    pub username: String,
    pub auth: Auth,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn with_password(
        login_uri: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            login_uri: login_uri.into(),
            username: username.into(),
            auth: Auth::Password(Zeroizing::new(password.into())),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_certificate(
        login_uri: impl Into<String>,
        username: impl Into<String>,
        cert_file: impl Into<PathBuf>,
        key_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            login_uri: login_uri.into(),
            username: username.into(),
            auth: Auth::Certificate {
                cert_file: cert_file.into(),
                key_file: key_file.into(),
            },
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reads the configuration from `CERT_MANAGER_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| Error::config(format!("{key} not set")))
        };

        let login_uri = required("CERT_MANAGER_LOGIN_URI")?;
        let username = required("CERT_MANAGER_USERNAME")?;

        let mut config = match lookup("CERT_MANAGER_PASSWORD") {
            Some(password) => Self::with_password(login_uri, username, password),
            None => Self::with_certificate(
                login_uri,
                username,
                required("CERT_MANAGER_CERT_FILE")?,
                required("CERT_MANAGER_KEY_FILE")?,
            ),
        };
        if let Some(base_url) = lookup("CERT_MANAGER_BASE_URL") {
            config.base_url = base_url;
        }
        config.timeout = resolve_timeout(lookup("CERT_MANAGER_HTTP_TIMEOUT_SECS"));
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.login_uri.trim().is_empty() {
            return Err(Error::config("login_uri is required"));
        }
        if self.username.trim().is_empty() {
            return Err(Error::config("username is required"));
        }
        reqwest::Url::parse(&self.base_url)
            .map_err(|err| Error::config(format!("invalid base_url {}: {err}", self.base_url)))?;
        if let Auth::Certificate { .. } = self.auth {
            if !self.base_url.contains("/private") {
                warn!(
                    "[config] base URL should probably be {} due to certificate auth",
                    self.base_url.replacen("/api", "/private/api", 1)
                );
            }
        }
        Ok(())
    }

    /// Headers sent with every request.
    pub fn default_headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![
            ("login".to_string(), self.username.clone()),
            ("customerUri".to_string(), self.login_uri.clone()),
            ("Accept".to_string(), "application/json".to_string()),
            ("User-Agent".to_string(), user_agent()),
        ];
        if let Auth::Password(password) = &self.auth {
            headers.push(("password".to_string(), password.as_str().to_string()));
        }
        headers
    }
}

pub fn user_agent() -> String {
    format!("cert_manager/{} (Rust)", env!("CARGO_PKG_VERSION"))
}

fn resolve_timeout(raw: Option<String>) -> Duration {
    let Some(raw) = raw else {
        return Duration::from_secs(DEFAULT_TIMEOUT_SECS);
    };
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Duration::from_secs(secs),
        _ => {
            warn!("[config] invalid timeout value '{raw}'; using {DEFAULT_TIMEOUT_SECS}s");
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        }
    }
}
