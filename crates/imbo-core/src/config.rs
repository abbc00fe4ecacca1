//! Configuration module
//!
//! Holds the key material used to sign URLs and the client-level settings
//! (hosts and keys) that can be loaded from the environment.

use std::env;
use std::fmt;

use serde::Serialize;

use crate::error::{ImboError, ImboResult};

/// Public/private key pair plus the user the URLs act on behalf of.
///
/// The private key is only ever fed to the signer; it is never serialized
/// and is redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    public_key: String,
    #[serde(skip)]
    private_key: String,
    user: String,
}

impl Credentials {
    /// Create credentials. `user` defaults to the public key when absent.
    pub fn new(
        public_key: impl Into<String>,
        private_key: impl Into<String>,
        user: Option<String>,
    ) -> ImboResult<Self> {
        let public_key = public_key.into();
        let private_key = private_key.into();

        validate_identifier("public key", &public_key)?;
        if private_key.is_empty() {
            return Err(ImboError::invalid_configuration(
                "private key must not be empty",
            ));
        }

        let user = match user {
            Some(user) => {
                validate_identifier("user", &user)?;
                user
            }
            None => public_key.clone(),
        };

        Ok(Self {
            public_key,
            private_key,
            user,
        })
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub(crate) fn private_key(&self) -> &str {
        &self.private_key
    }

    /// Whether the public key acts on behalf of another user. When true the
    /// path no longer implies the acting key, so URLs carry `publicKey=`.
    pub fn is_delegated(&self) -> bool {
        self.user != self.public_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

/// Keys and users end up as path segments and query values, so they must be
/// non-empty and free of whitespace and path separators.
fn validate_identifier(name: &str, value: &str) -> ImboResult<()> {
    if value.is_empty() {
        return Err(ImboError::invalid_configuration(format!(
            "{} must not be empty",
            name
        )));
    }
    if value.chars().any(|c| c.is_whitespace() || c == '/') {
        return Err(ImboError::invalid_configuration(format!(
            "{} must not contain whitespace or '/': {:?}",
            name, value
        )));
    }
    Ok(())
}

/// Normalize a host: trailing slashes removed, `http://` added when no scheme.
pub fn normalize_host(host: &str) -> ImboResult<String> {
    let host = host.trim().trim_end_matches('/');
    if host.is_empty() {
        return Err(ImboError::invalid_configuration("host must not be empty"));
    }
    if host.starts_with("http://") || host.starts_with("https://") {
        Ok(host.to_string())
    } else {
        Ok(format!("http://{}", host))
    }
}

/// Client configuration: one or more hosts plus credentials.
#[derive(Clone, Debug, Serialize)]
pub struct ClientConfig {
    pub hosts: Vec<String>,
    pub credentials: Credentials,
}

impl ClientConfig {
    pub fn new(hosts: &[&str], credentials: Credentials) -> ImboResult<Self> {
        let config = Self {
            hosts: hosts
                .iter()
                .map(|host| normalize_host(host))
                .collect::<ImboResult<Vec<_>>>()?,
            credentials,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the environment (a `.env` file is honored):
    /// `IMBO_HOSTS` (comma-separated), `IMBO_PUBLIC_KEY`, `IMBO_PRIVATE_KEY`
    /// and the optional `IMBO_USER`.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let hosts_str = env::var("IMBO_HOSTS")
            .or_else(|_| env::var("IMBO_HOST"))
            .map_err(|_| anyhow::anyhow!("IMBO_HOSTS must be set"))?;
        let hosts: Vec<&str> = hosts_str
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();

        let public_key = env::var("IMBO_PUBLIC_KEY")
            .map_err(|_| anyhow::anyhow!("IMBO_PUBLIC_KEY must be set"))?;
        let private_key = env::var("IMBO_PRIVATE_KEY")
            .map_err(|_| anyhow::anyhow!("IMBO_PRIVATE_KEY must be set"))?;
        let user = env::var("IMBO_USER").ok().filter(|u| !u.is_empty());

        let credentials = Credentials::new(public_key, private_key, user)?;
        Ok(Self::new(&hosts, credentials)?)
    }

    pub fn validate(&self) -> ImboResult<()> {
        if self.hosts.is_empty() {
            return Err(ImboError::invalid_configuration(
                "at least one host must be configured",
            ));
        }
        Ok(())
    }
}
