use std::env;

use crate::config::ConfigError;

/// Listen address. `APP_HOST` may be an IP address or a host name such as `localhost`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = match env::var("APP_PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidValue(format!("Invalid APP_PORT value: {}", raw)))?,
            Err(_) => 8080,
        };
        let config = AppConfig { host, port };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::ValidationError("APP_HOST cannot be empty".to_string()));
        }
        if self.port == 0 {
            return Err(ConfigError::ValidationError("APP_PORT must be greater than 0".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        let config = AppConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
        };
        assert!(config.validate().is_ok());
        assert!(AppConfig { port: 0, ..config }.validate().is_err());
    }
}
