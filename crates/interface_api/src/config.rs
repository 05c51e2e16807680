//! API configuration

use core_kernel::CoreError;
use serde::Deserialize;

/// Shortest accepted HS256 signing secret, in bytes
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// JWT signing secret; required, no default
    pub jwt_secret: String,
    /// JWT expiration in seconds
    pub jwt_expiration_secs: u64,
    /// Database URL
    pub database_url: String,
    /// Upper bound of the connection pool
    pub db_max_connections: u32,
    /// Log level used when `RUST_LOG` is unset
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable ones
    pub log_json: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: String::new(),
            jwt_expiration_secs: 3600,
            database_url: "postgres://localhost/billing".to_string(),
            db_max_connections: 10,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from `API_*` environment variables
    ///
    /// Every field except `jwt_secret` has a default. The result is
    /// validated before it is returned.
    pub fn from_env() -> Result<Self, CoreError> {
        let defaults = Self::default();
        let config: Self = config::Config::builder()
            .set_default("host", defaults.host)
            .and_then(|b| b.set_default("port", i64::from(defaults.port)))
            .and_then(|b| b.set_default("jwt_expiration_secs", defaults.jwt_expiration_secs as i64))
            .and_then(|b| b.set_default("database_url", defaults.database_url))
            .and_then(|b| b.set_default("db_max_connections", i64::from(defaults.db_max_connections)))
            .and_then(|b| b.set_default("log_level", defaults.log_level))
            .and_then(|b| b.set_default("log_json", defaults.log_json))
            .map_err(|e| CoreError::configuration(e.to_string()))?
            .add_source(config::Environment::with_prefix("API").try_parsing(true))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| CoreError::configuration(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Refuses configurations the server must not start with
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(CoreError::configuration("API_JWT_SECRET must be set"));
        }
        if self.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(CoreError::configuration(format!(
                "API_JWT_SECRET must be at least {} bytes",
                MIN_JWT_SECRET_LEN
            )));
        }
        if self.jwt_expiration_secs == 0 {
            return Err(CoreError::configuration("API_JWT_EXPIRATION_SECS must be positive"));
        }
        if self.db_max_connections == 0 {
            return Err(CoreError::configuration("API_DB_MAX_CONNECTIONS must be positive"));
        }
        Ok(())
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_secret(secret: &str) -> ApiConfig {
        ApiConfig {
            jwt_secret: secret.to_string(),
            ..ApiConfig::default()
        }
    }

    #[test]
    fn test_missing_secret_is_rejected() {
        let err = ApiConfig::default().validate().unwrap_err();
        assert!(matches!(err, CoreError::Configuration(_)));
    }

    #[test]
    fn test_short_secret_is_rejected() {
        assert!(with_secret("too-short").validate().is_err());
        assert!(with_secret(&"x".repeat(MIN_JWT_SECRET_LEN - 1)).validate().is_err());
    }

    #[test]
    fn test_long_secret_is_accepted() {
        assert!(with_secret(&"x".repeat(MIN_JWT_SECRET_LEN)).validate().is_ok());
    }

    #[test]
    fn test_zero_pool_size_is_rejected() {
        let config = ApiConfig {
            db_max_connections: 0,
            ..with_secret(&"x".repeat(48))
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_server_addr() {
        assert_eq!(ApiConfig::default().server_addr(), "0.0.0.0:8080");
    }
}
