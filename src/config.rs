//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup; secrets come from the environment
//! (injected by the deployment platform) rather than a secrets API.

use std::env;

/// Name of the session cookie carrying the JWT.
pub const SESSION_COOKIE: &str = "fitsavory_token";

/// Header carrying the HMAC signature for `/internal/push` requests.
pub const PUSH_SIGNATURE_HEADER: &str = "x-push-signature";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL for CORS and redirects
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// MySQL connection URL
    pub database_url: String,
    /// ISO currency code used for all charges
    pub currency: String,

    // --- Secrets ---
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Shared secret for the internal push/broadcast endpoint
    pub push_shared_secret: Vec<u8>,
    /// Payment gateway secret key
    pub gateway_secret_key: String,
    /// Payment gateway webhook signing secret
    pub gateway_webhook_secret: Vec<u8>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            database_url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL"))?,
            currency: env::var("CURRENCY").unwrap_or_else(|_| "USD".to_string()),

            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            push_shared_secret: env::var("PUSH_SHARED_SECRET")
                .map_err(|_| ConfigError::Missing("PUSH_SHARED_SECRET"))?
                .into_bytes(),
            gateway_secret_key: env::var("GATEWAY_SECRET_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("GATEWAY_SECRET_KEY"))?,
            gateway_webhook_secret: env::var("GATEWAY_WEBHOOK_SECRET")
                .map_err(|_| ConfigError::Missing("GATEWAY_WEBHOOK_SECRET"))?
                .into_bytes(),
        })
    }

    /// Default config for tests only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            database_url: "mysql://root@localhost/fitsavory_test".to_string(),
            currency: "USD".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!!".to_vec(),
            push_shared_secret: b"test_push_shared_secret".to_vec(),
            gateway_secret_key: "sk_test_secret".to_string(),
            gateway_webhook_secret: b"test_webhook_secret".to_vec(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("DATABASE_URL", "mysql://root@localhost/fitsavory");
        env::set_var("JWT_SIGNING_KEY", "test_jwt_key_32_bytes_minimum!!!");
        env::set_var("PUSH_SHARED_SECRET", "test_push");
        env::set_var("GATEWAY_SECRET_KEY", "sk_test");
        env::set_var("GATEWAY_WEBHOOK_SECRET", "whsec_test");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.database_url, "mysql://root@localhost/fitsavory");
        assert_eq!(config.gateway_secret_key, "sk_test");
        assert_eq!(config.port, 8080);
    }
}
