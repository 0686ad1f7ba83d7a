//! Operator authentication.
//!
//! A closed set of strategies selected once from configuration. Callers hand
//! over the `X-Beam-User` / `X-Beam-Key` values they received and get a
//! yes/no answer.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::{ConfigError, Error, Result};
use crate::infrastructure::config::auth::{AuthConfig, AuthKind};

/// Header carrying the user name.
pub const USER_HEADER: &str = "X-Beam-User";
/// Header carrying the user's key.
pub const KEY_HEADER: &str = "X-Beam-Key";

/// Credentials presented by a caller; either part may be missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Credentials<'a> {
    pub user: Option<&'a str>,
    pub key: Option<&'a str>,
}

impl<'a> Credentials<'a> {
    #[must_use]
    pub fn new(user: Option<&'a str>, key: Option<&'a str>) -> Self {
        Self { user, key }
    }
}

#[derive(Debug, Deserialize)]
struct KeysFile {
    #[serde(default)]
    users: HashMap<String, String>,
}

/// User name to key table loaded from a TOML `[users]` section.
#[derive(Debug, Clone, Default)]
pub struct StaticKeys {
    users: HashMap<String, String>,
}

impl StaticKeys {
    pub fn parse(content: &str) -> Result<Self> {
        let file: KeysFile = toml::from_str(content).map_err(ConfigError::Parse)?;
        Ok(Self { users: file.users })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse(&content)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn verify(&self, user: &str, key: &str) -> bool {
        self.users.get(user).is_some_and(|expected| {
            Sha256::digest(expected.as_bytes()) == Sha256::digest(key.as_bytes())
        })
    }
}

/// How operator requests are verified.
#[derive(Debug, Clone)]
pub enum AuthStrategy {
    /// Accept everything.
    Disabled,
    /// Accept known user/key pairs.
    StaticKeys(StaticKeys),
}

impl AuthStrategy {
    /// Select and initialize the configured strategy.
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        match config.strategy {
            AuthKind::Disabled => Ok(Self::Disabled),
            AuthKind::StaticKeys => {
                let path = config
                    .keys_file
                    .as_deref()
                    .ok_or(ConfigError::MissingField { field: "keys_file" })?;
                let keys = StaticKeys::load(path)?;
                info!(users = keys.len(), "Static key authentication enabled");
                Ok(Self::StaticKeys(keys))
            }
        }
    }

    #[must_use]
    pub fn verify(&self, credentials: &Credentials<'_>) -> bool {
        match self {
            Self::Disabled => true,
            Self::StaticKeys(keys) => match (credentials.user, credentials.key) {
                (Some(user), Some(key)) => {
                    debug!(user = %user, "Authenticating user");
                    keys.verify(user, key)
                }
                _ => {
                    debug!("Missing {USER_HEADER} or {KEY_HEADER}");
                    false
                }
            },
        }
    }

    /// [`Self::verify`] as a `Result`.
    pub fn authorize(&self, credentials: &Credentials<'_>) -> Result<()> {
        if self.verify(credentials) {
            Ok(())
        } else {
            Err(Error::Unauthorized(
                credentials.user.unwrap_or("anonymous").to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const KEYS: &str = r#"
[users]
alice = "s3cret"
bob = "hunter2"
"#;

    fn static_keys() -> AuthStrategy {
        AuthStrategy::StaticKeys(StaticKeys::parse(KEYS).unwrap())
    }

    #[test]
    fn disabled_accepts_anything() {
        assert!(AuthStrategy::Disabled.verify(&Credentials::default()));
    }

    #[test]
    fn static_keys_check_pairs() {
        let auth = static_keys();
        assert!(auth.verify(&Credentials::new(Some("alice"), Some("s3cret"))));
        assert!(!auth.verify(&Credentials::new(Some("alice"), Some("hunter2"))));
        assert!(!auth.verify(&Credentials::new(Some("mallory"), Some("s3cret"))));
    }

    #[test]
    fn missing_headers_are_rejected() {
        let auth = static_keys();
        assert!(!auth.verify(&Credentials::new(Some("alice"), None)));
        assert!(!auth.verify(&Credentials::new(None, Some("s3cret"))));
        assert!(matches!(
            auth.authorize(&Credentials::default()),
            Err(Error::Unauthorized(_))
        ));
    }

    #[test]
    fn loads_from_configured_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(KEYS.as_bytes()).unwrap();

        let config = AuthConfig {
            strategy: AuthKind::StaticKeys,
            keys_file: Some(file.path().display().to_string()),
        };
        let auth = AuthStrategy::from_config(&config).unwrap();
        assert!(auth.verify(&Credentials::new(Some("bob"), Some("hunter2"))));
    }

    #[test]
    fn unreadable_keys_file_is_a_config_error() {
        let config = AuthConfig {
            strategy: AuthKind::StaticKeys,
            keys_file: Some("/nonexistent/lbsync/auth.toml".to_string()),
        };
        assert!(matches!(
            AuthStrategy::from_config(&config),
            Err(Error::Config(ConfigError::ReadFile(_)))
        ));
    }
}
