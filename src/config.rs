//! Gateway configuration loaded from environment variables.

use serde::Deserialize;
use url::Url;

/// Gateway configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Myriad Credentials ===
    /// API key for the Myriad API (`x-api-key`). Some endpoints are public,
    /// so a missing key is not an error.
    #[serde(default)]
    pub myriad_api_key: Option<String>,

    /// Base URL for the Myriad API.
    #[serde(default = "default_api_url")]
    pub myriad_api_url: String,

    /// Per-request timeout in seconds for upstream calls.
    #[serde(default = "default_timeout_secs")]
    pub http_timeout_secs: u64,

    // === Bot Advisory Settings ===
    /// Comma-separated list of tracked asset tickers. Advisory only; echoed
    /// by `GET /config`.
    #[serde(default = "default_assets")]
    pub assets: String,

    /// Trading loop interval hint (e.g. "15m"). Advisory only.
    #[serde(default = "default_interval")]
    pub interval: String,

    // === Server Configuration ===
    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,
}

fn default_api_url() -> String {
    "https://api-v2.myriadprotocol.com/".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_assets() -> String {
    "BTC,ETH,SOL,XRP,DOGE,BNB".to_string()
}

fn default_interval() -> String {
    "15m".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        let url = Url::parse(&self.myriad_api_url)
            .map_err(|e| format!("MYRIAD_API_URL is not a valid URL: {}", e))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!(
                "MYRIAD_API_URL must be http(s), got '{}'",
                url.scheme()
            ));
        }

        if self.http_timeout_secs == 0 {
            return Err("HTTP_TIMEOUT_SECS must be greater than 0".to_string());
        }

        if self.assets.trim().is_empty() {
            return Err("ASSETS must name at least one ticker".to_string());
        }

        Ok(())
    }

    /// Tracked asset tickers, split and trimmed.
    pub fn assets_list(&self) -> Vec<String> {
        self.assets
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            myriad_api_key: None,
            myriad_api_url: default_api_url(),
            http_timeout_secs: default_timeout_secs(),
            assets: default_assets(),
            interval: default_interval(),
            port: default_port(),
            rust_log: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values_are_sensible() {
        let config = Config::default();
        assert_eq!(config.myriad_api_url, "https://api-v2.myriadprotocol.com/");
        assert_eq!(config.http_timeout_secs, 30);
        assert_eq!(config.port, 8000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_base_url() {
        let config = Config {
            myriad_api_url: "not a url".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            myriad_api_url: "ftp://api-v2.myriadprotocol.com/".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let config = Config {
            http_timeout_secs: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn assets_list_splits_and_trims() {
        let config = Config {
            assets: "BTC, ETH ,SOL,,DOGE".to_string(),
            ..Config::default()
        };
        assert_eq!(config.assets_list(), vec!["BTC", "ETH", "SOL", "DOGE"]);
    }
}
