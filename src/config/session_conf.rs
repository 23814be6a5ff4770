use std::env;
use tracing::{debug, error, info};

use crate::config::ConfigError;

/// Minimum secret length accepted for signing session cookies.
pub const MIN_SECRET_LEN: usize = 64;

pub const DEFAULT_INACTIVITY_MINUTES: i64 = 120;

/// Session cookie settings.
///
/// Expected environment variables:
/// - SESSION_SECRET: signing secret, at least 64 bytes (required, no fallback)
/// - SESSION_COOKIE_NAME: cookie name (defaults to `billing_session`)
/// - SESSION_COOKIE_SECURE: `true` to mark the cookie Secure (defaults to `false`)
/// - SESSION_INACTIVITY_MINUTES: expire after this much inactivity (defaults to 120)
#[derive(Clone)]
pub struct SessionConfig {
    pub secret: String,
    pub cookie_name: String,
    pub secure: bool,
    pub inactivity_minutes: i64,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret", &"<redacted>")
            .field("cookie_name", &self.cookie_name)
            .field("secure", &self.secure)
            .field("inactivity_minutes", &self.inactivity_minutes)
            .finish()
    }
}

impl SessionConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading session configuration from environment variables");

        let secret = env::var("SESSION_SECRET").map_err(|_| {
            error!("SESSION_SECRET environment variable not found");
            ConfigError::EnvVarNotFound("SESSION_SECRET".to_string())
        })?;

        let cookie_name = env::var("SESSION_COOKIE_NAME").unwrap_or_else(|_| "billing_session".to_string());

        let secure = match env::var("SESSION_COOKIE_SECURE") {
            Ok(raw) => raw.parse::<bool>().map_err(|_| {
                ConfigError::InvalidValue(format!("Invalid SESSION_COOKIE_SECURE value: {}", raw))
            })?,
            Err(_) => false,
        };

        let inactivity_minutes = match env::var("SESSION_INACTIVITY_MINUTES") {
            Ok(raw) => raw.parse::<i64>().map_err(|_| {
                ConfigError::InvalidValue(format!("Invalid SESSION_INACTIVITY_MINUTES value: {}", raw))
            })?,
            Err(_) => DEFAULT_INACTIVITY_MINUTES,
        };
        debug!(cookie_name = %cookie_name, secure, inactivity_minutes, "Session settings");

        let config = SessionConfig {
            secret,
            cookie_name,
            secure,
            inactivity_minutes,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::ValidationError(format!(
                "SESSION_SECRET must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }
        if self.cookie_name.is_empty() {
            return Err(ConfigError::ValidationError("Session cookie name cannot be empty".to_string()));
        }
        if self.inactivity_minutes <= 0 {
            return Err(ConfigError::ValidationError(
                "SESSION_INACTIVITY_MINUTES must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
