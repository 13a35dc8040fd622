//! Client error taxonomy.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors from the compliance data API client.
///
/// `Unreachable` and `Http` are transient — the scoring service surfaces
/// them as data-unavailable and the caller may retry with backoff.
#[derive(Debug, Error)]
pub enum ComplianceApiError {
    /// Client configuration was invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Transport-level failure: connection refused, DNS, timeout.
    #[error("compliance API unreachable at {endpoint}: {source}")]
    Unreachable {
        /// The endpoint that failed.
        endpoint: String,
        /// Underlying reqwest error.
        source: reqwest::Error,
    },

    /// The API answered with a non-success status.
    #[error("compliance API returned {status} for {endpoint}")]
    Http {
        /// The endpoint that failed.
        endpoint: String,
        /// HTTP status code returned.
        status: u16,
    },

    /// The response body could not be decoded.
    #[error("failed to decode response from {endpoint}: {message}")]
    Decode {
        /// The endpoint that failed.
        endpoint: String,
        /// Decode failure detail.
        message: String,
    },
}

impl ComplianceApiError {
    /// Whether the caller may reasonably retry the operation.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Unreachable { .. } => true,
            Self::Http { status, .. } => *status >= 500,
            Self::Config(_) | Self::Decode { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_transient() {
        let err = ComplianceApiError::Http {
            endpoint: "/api/v1/metrics/tasks".to_string(),
            status: 503,
        };
        assert!(err.is_transient());
    }

    #[test]
    fn client_errors_are_not_transient() {
        let err = ComplianceApiError::Http {
            endpoint: "/api/v1/metrics/tasks".to_string(),
            status: 404,
        };
        assert!(!err.is_transient());

        let decode = ComplianceApiError::Decode {
            endpoint: "/api/v1/metrics/risks".to_string(),
            message: "missing field".to_string(),
        };
        assert!(!decode.is_transient());
    }
}
