//! Authentication strategy selection.

use serde::Deserialize;

/// Which verification strategy guards operator requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthKind {
    /// Every request is accepted.
    #[default]
    Disabled,
    /// User/key pairs read from a TOML file.
    StaticKeys,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub strategy: AuthKind,
    /// Credentials file for [`AuthKind::StaticKeys`].
    #[serde(default)]
    pub keys_file: Option<String>,
}
