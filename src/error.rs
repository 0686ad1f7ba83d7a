use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A scope-requiring operation ran before its parent reference was bound.
    #[error("you must select a {0} first")]
    NotSelected(&'static str),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("could not resolve {0}")]
    HostNotFound(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("cache error: {0}")]
    Cache(String),

    #[error("invalid name '{0}': must begin with '/'")]
    InvalidName(String),

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("conflicting request: {0}")]
    Conflict(String),

    #[error("cache is not warm yet, try again later")]
    NotReady,

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<redis::RedisError> for Error {
    fn from(err: redis::RedisError) -> Self {
        Error::Cache(err.to_string())
    }
}

impl From<diesel::result::Error> for Error {
    fn from(err: diesel::result::Error) -> Self {
        Error::Database(err.to_string())
    }
}

impl Error {
    /// True for failures caused by an unreachable device.
    #[must_use]
    pub fn is_device_unreachable(&self) -> bool {
        match self {
            Error::HostNotFound(_) | Error::Connection(_) => true,
            Error::Http(err) => err.is_connect() || err.is_timeout(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_selected_names_missing_scope() {
        let err = Error::NotSelected("pool");
        assert_eq!(err.to_string(), "you must select a pool first");
    }

    #[test]
    fn diesel_errors_become_database_errors() {
        let err: Error = diesel::result::Error::NotFound.into();
        assert!(matches!(err, Error::Database(_)));
    }

    #[test]
    fn unreachable_classification() {
        assert!(Error::HostNotFound("lb1".into()).is_device_unreachable());
        assert!(Error::Connection("refused".into()).is_device_unreachable());
        assert!(!Error::NotFound("x".into()).is_device_unreachable());
    }
}
