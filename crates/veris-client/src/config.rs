//! Compliance data API client configuration.
//!
//! The upstream API owns the task and risk records this service scores.
//! Configure via environment variables or explicit construction for tests.

use url::Url;

/// Configuration for connecting to the compliance data API.
///
/// Custom `Debug` redacts the `api_token` to prevent credential leakage
/// in log output.
#[derive(Clone)]
pub struct ComplianceApiConfig {
    /// Base URL of the compliance data API.
    pub base_url: Url,
    /// Optional bearer token for API authentication.
    pub api_token: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for ComplianceApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComplianceApiConfig")
            .field("base_url", &self.base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ComplianceApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `COMPLIANCE_API_URL` (required)
    /// - `COMPLIANCE_API_TOKEN` (optional)
    /// - `COMPLIANCE_TIMEOUT_SECS` (default: 10)
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw = std::env::var("COMPLIANCE_API_URL").map_err(|_| ConfigError::MissingUrl)?;
        let base_url = Url::parse(&raw)
            .map_err(|e| ConfigError::InvalidUrl("COMPLIANCE_API_URL".to_string(), e.to_string()))?;

        Ok(Self {
            base_url,
            api_token: std::env::var("COMPLIANCE_API_TOKEN").ok(),
            timeout_secs: std::env::var("COMPLIANCE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
        })
    }

    /// Create a configuration pointing at an arbitrary base URL (for tests).
    pub fn for_base_url(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: Url::parse(base_url)
                .map_err(|e| ConfigError::InvalidUrl(base_url.to_string(), e.to_string()))?,
            api_token: None,
            timeout_secs: 5,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `COMPLIANCE_API_URL` is not set.
    #[error("COMPLIANCE_API_URL environment variable is required")]
    MissingUrl,
    /// A URL could not be parsed.
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_token() {
        let config = ComplianceApiConfig {
            base_url: Url::parse("http://127.0.0.1:9000").unwrap(),
            api_token: Some("super-secret".to_string()),
            timeout_secs: 10,
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn for_base_url_rejects_garbage() {
        assert!(ComplianceApiConfig::for_base_url("not a url").is_err());
    }
}
