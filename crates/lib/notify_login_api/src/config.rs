//! API server configuration.

use http::HeaderValue;
use thiserror::Error;

/// Cookie carrying the issued token.
pub const DEFAULT_COOKIE_NAME: &str = "notifyToken";
/// Token cookie lifetime in seconds. Tokens never expire server-side.
pub const DEFAULT_COOKIE_MAX_AGE_SECS: i64 = 10_000_000_000;
/// Browser origin allowed to call the API with credentials.
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:4200";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid allowed origin '{0}'")]
    InvalidOrigin(String),
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3000").
    pub bind_addr: String,
    /// Value of `Access-Control-Allow-Origin`.
    pub allowed_origin: HeaderValue,
    pub cookie_name: String,
    pub cookie_max_age_secs: i64,
}

impl ApiConfig {
    /// Config with the default cookie settings.
    pub fn new(bind_addr: impl Into<String>, allowed_origin: &str) -> Result<Self, ConfigError> {
        let allowed_origin = HeaderValue::from_str(allowed_origin)
            .map_err(|_| ConfigError::InvalidOrigin(allowed_origin.to_string()))?;
        Ok(Self {
            bind_addr: bind_addr.into(),
            allowed_origin,
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            cookie_max_age_secs: DEFAULT_COOKIE_MAX_AGE_SECS,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ApiConfig::new("127.0.0.1:3000", DEFAULT_ALLOWED_ORIGIN).unwrap();
        assert_eq!(config.cookie_name, "notifyToken");
        assert_eq!(config.cookie_max_age_secs, 10_000_000_000);
        assert_eq!(config.allowed_origin, "http://localhost:4200");
    }

    #[test]
    fn rejects_origin_with_control_chars() {
        let err = ApiConfig::new("127.0.0.1:3000", "http://bad\norigin").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOrigin(_)));
    }
}
