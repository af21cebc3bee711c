//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::util::rate_limit::GEOCODE_RATE_LIMIT;

/// Public Nominatim instance
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// CSV file holding the location list
    pub data_file: PathBuf,

    /// Base URL of the Nominatim-compatible geocoder
    pub geocoder_url: String,
    /// User-Agent sent to the geocoder (Nominatim rejects anonymous clients)
    pub geocoder_user_agent: String,
    /// Geocoder requests allowed per second
    pub geocoder_rate_per_sec: u32,
    /// Timeout for a single geocoder request
    pub geocoder_timeout: Duration,

    /// Allowed client origins for CORS (comma-separated)
    pub client_origin: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // PORT wins over SERVER_ADDR so hosted platforms can inject it
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:5000".to_string())
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            data_file: env::var("DATA_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/data.csv")),

            geocoder_url: env::var("GEOCODER_URL")
                .unwrap_or_else(|_| DEFAULT_GEOCODER_URL.to_string()),
            geocoder_user_agent: env::var("GEOCODER_USER_AGENT").unwrap_or_else(|_| {
                format!("franchise-radius-server/{}", env!("CARGO_PKG_VERSION"))
            }),
            geocoder_rate_per_sec: parse_var("GEOCODER_RATE_PER_SEC", GEOCODE_RATE_LIMIT)?,
            geocoder_timeout: Duration::from_secs(parse_var("GEOCODER_TIMEOUT_SECS", 10)?),

            client_origin: env::var("CLIENT_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
        })
    }

    /// Parsed CORS origin list
    pub fn allowed_origins(&self) -> Vec<String> {
        self.client_origin
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_origins_split_and_trim() {
        let config = Config {
            server_addr: "127.0.0.1:5000".parse().unwrap(),
            log_level: "info".to_string(),
            data_file: PathBuf::from("data.csv"),
            geocoder_url: DEFAULT_GEOCODER_URL.to_string(),
            geocoder_user_agent: "test".to_string(),
            geocoder_rate_per_sec: 1,
            geocoder_timeout: Duration::from_secs(1),
            client_origin: "http://localhost:3000, https://map.example.com,,".to_string(),
        };

        assert_eq!(
            config.allowed_origins(),
            vec!["http://localhost:3000", "https://map.example.com"]
        );
    }
}
