//! # API Error Types
//!
//! Everything a handler can fail with, mapped onto the service's HTTP
//! error contract. Client mistakes keep their message in the response;
//! server-side failures are logged in full and answered with a generic
//! message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// JSON body every error response carries.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Stable machine-readable code, e.g. `SCOPE_NOT_FOUND`.
    pub code: String,
    pub message: String,
    /// Extra context for client errors only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Referenced framework is outside the catalog (404).
    #[error("scope not found: {0}")]
    ScopeNotFound(String),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Aggregated metrics violate a data-integrity invariant (500).
    ///
    /// Indicates an upstream data bug, not a caller mistake. The full
    /// detail is logged; the response carries a generic message.
    #[error("invalid metrics: {0}")]
    InvalidMetrics(#[from] veris_core::InvalidMetricsError),

    /// Upstream task/risk store unreachable (502). Transient; the caller
    /// may retry with backoff. Nothing is partially persisted.
    #[error("compliance data unavailable: {0}")]
    DataUnavailable(String),

    /// Snapshot append failed (500). The computed scores are discarded so
    /// an unpersisted snapshot can never become "latest".
    #[error("persistence error: {0}")]
    Persistence(String),

    /// No data source is configured for the requested operation (503).
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error (500). Message is logged but not returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::ScopeNotFound(_) => (StatusCode::NOT_FOUND, "SCOPE_NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::InvalidMetrics(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INVALID_METRICS"),
            Self::DataUnavailable(_) => (StatusCode::BAD_GATEWAY, "DATA_UNAVAILABLE"),
            Self::Persistence(_) => (StatusCode::INTERNAL_SERVER_ERROR, "PERSISTENCE_ERROR"),
            Self::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
            }
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    /// Message placed in the response body. Server-side failures get a
    /// generic message; the real cause stays in the logs.
    fn public_message(&self) -> String {
        match self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            Self::Persistence(_) => {
                "Failed to record the calculation; retry the operation".to_string()
            }
            Self::InvalidMetrics(_) => {
                "Aggregated metrics violate integrity invariants".to_string()
            }
            other => other.to_string(),
        }
    }

    fn log(&self) {
        match self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::Persistence(_) => tracing::error!(error = %self, "snapshot persistence failed"),
            Self::InvalidMetrics(_) => {
                tracing::error!(error = %self, "upstream data integrity violation")
            }
            Self::DataUnavailable(_) => tracing::warn!(error = %self, "upstream data unavailable"),
            Self::ServiceUnavailable(_) => tracing::warn!(error = %self, "service unavailable"),
            Self::ScopeNotFound(_) | Self::Validation(_) => {}
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        let (status, code) = self.status_and_code();
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.public_message(),
                details: None,
            },
        };
        (status, Json(body)).into_response()
    }
}

/// Convert scope construction errors to validation errors.
impl From<veris_core::ScopeError> for AppError {
    fn from(err: veris_core::ScopeError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Convert upstream client errors: configuration problems mean the data
/// source is effectively absent; everything else is data-unavailable.
impl From<veris_client::ComplianceApiError> for AppError {
    fn from(err: veris_client::ComplianceApiError) -> Self {
        match &err {
            veris_client::ComplianceApiError::Config(_) => {
                Self::ServiceUnavailable(err.to_string())
            }
            _ => Self::DataUnavailable(err.to_string()),
        }
    }
}

/// Convert storage errors from snapshot persistence.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}
