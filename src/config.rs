//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default backend base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";

/// Pause between a successful step and navigation.
pub const DEFAULT_PACING: Duration = Duration::from_millis(1500);

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL all endpoint paths are appended to (no trailing slash).
    pub api_url: String,
    /// Optional bearer token sent with every request.
    pub api_token: Option<SecretString>,
    /// Location of the local libSQL database holding session and local state.
    pub db_path: PathBuf,
    /// Delay between a success message and advancing the wizard.
    pub pacing: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_token: None,
            db_path: PathBuf::from("./data/org-onboard.db"),
            pacing: DEFAULT_PACING,
        }
    }
}

impl ClientConfig {
    /// Build config from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let api_url = match std::env::var("ORG_ONBOARD_API_URL") {
            Ok(url) => normalize_base_url(&url)?,
            Err(_) => defaults.api_url,
        };

        let api_token = std::env::var("ORG_ONBOARD_API_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty())
            .map(SecretString::from);

        let db_path = std::env::var("ORG_ONBOARD_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let pacing = match std::env::var("ORG_ONBOARD_PACING_MS") {
            Ok(raw) => {
                let ms: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: "ORG_ONBOARD_PACING_MS".to_string(),
                    message: format!("expected milliseconds, got {raw:?}"),
                })?;
                Duration::from_millis(ms)
            }
            Err(_) => defaults.pacing,
        };

        Ok(Self {
            api_url,
            api_token,
            db_path,
            pacing,
        })
    }

    /// Join an endpoint path such as `/basic-info` onto the base URL.
    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::InvalidValue {
            key: "ORG_ONBOARD_API_URL".to_string(),
            message: format!("must start with http:// or https://, got {raw:?}"),
        });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_url_joins_single_slash() {
        let config = ClientConfig {
            api_url: "https://api.example.com/api/v1".into(),
            ..ClientConfig::default()
        };
        assert_eq!(
            config.endpoint_url("/basic-info"),
            "https://api.example.com/api/v1/basic-info"
        );
        assert_eq!(
            config.endpoint_url("organizations"),
            "https://api.example.com/api/v1/organizations"
        );
    }

    #[test]
    fn base_url_trailing_slash_stripped() {
        assert_eq!(
            normalize_base_url(" https://x.io/api/v1/ ").unwrap(),
            "https://x.io/api/v1"
        );
    }

    #[test]
    fn base_url_requires_scheme() {
        assert!(normalize_base_url("x.io/api").is_err());
    }

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert!(config.api_token.is_none());
        assert_eq!(config.pacing, Duration::from_millis(1500));
    }
}
