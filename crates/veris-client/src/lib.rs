//! # veris-client — Typed client for the compliance data API
//!
//! The task and risk subsystems own their records; this crate is the only
//! path through which the scoring service reads them when running in
//! upstream mode. It exposes exactly the aggregation queries the scoring
//! pipeline needs:
//!
//! - `GET {base}/api/v1/metrics/tasks?userId=&frameworkId=` — task counts
//! - `GET {base}/api/v1/metrics/risks?userId=&frameworkId=` — risk counts
//! - `GET {base}/health` — reachability probe for readiness checks
//!
//! All responses are camelCase JSON. Transport failures and 5xx responses
//! are transient ([`ComplianceApiError::is_transient`]); the scoring
//! service maps them to its data-unavailable error and persists nothing.

pub mod config;
pub mod error;

pub use config::{ComplianceApiConfig, ConfigError};
pub use error::ComplianceApiError;

use std::time::Duration;

use serde::Deserialize;
use url::Url;

use veris_core::{Scope, ScopeMetrics};

/// Task counts for a scope, as reported by the task subsystem.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCounts {
    /// Total tasks in scope.
    pub total_tasks: u64,
    /// Tasks marked complete.
    pub completed_tasks: u64,
    /// Completed tasks finished on or before their due date.
    pub tasks_on_time: u64,
}

/// Risk counts for a scope, as reported by the risk subsystem.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskCounts {
    /// Unmitigated high-severity risks.
    pub high_risks: u64,
    /// Unmitigated medium-severity risks.
    pub medium_risks: u64,
    /// Unmitigated low-severity risks.
    pub low_risks: u64,
    /// Mitigated risks.
    pub mitigated_risks: u64,
}

/// Client for the upstream compliance data API.
#[derive(Debug, Clone)]
pub struct ComplianceClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ComplianceClient {
    /// Create a new client from configuration.
    pub fn new(config: ComplianceApiConfig) -> Result<Self, ComplianceApiError> {
        let mut builder = reqwest::Client::builder().timeout(Duration::from_secs(config.timeout_secs));

        if let Some(token) = &config.api_token {
            let mut headers = reqwest::header::HeaderMap::new();
            let value = reqwest::header::HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| {
                    ComplianceApiError::Config(ConfigError::InvalidUrl(
                        "COMPLIANCE_API_TOKEN".to_string(),
                        "token contains invalid header characters".to_string(),
                    ))
                })?;
            headers.insert(reqwest::header::AUTHORIZATION, value);
            builder = builder.default_headers(headers);
        }

        let http = builder.build().map_err(|source| ComplianceApiError::Unreachable {
            endpoint: "client_init".to_string(),
            source,
        })?;

        Ok(Self {
            http,
            base_url: config.base_url,
        })
    }

    /// Fetch task counts for a scope.
    pub async fn task_counts(&self, scope: &Scope) -> Result<TaskCounts, ComplianceApiError> {
        self.get_counts("/api/v1/metrics/tasks", scope).await
    }

    /// Fetch risk counts for a scope.
    pub async fn risk_counts(&self, scope: &Scope) -> Result<RiskCounts, ComplianceApiError> {
        self.get_counts("/api/v1/metrics/risks", scope).await
    }

    /// Fetch both count families and assemble [`ScopeMetrics`].
    ///
    /// Either query failing fails the whole aggregation — a snapshot is
    /// never built from partial data.
    pub async fn scope_metrics(&self, scope: &Scope) -> Result<ScopeMetrics, ComplianceApiError> {
        let tasks = self.task_counts(scope).await?;
        let risks = self.risk_counts(scope).await?;
        Ok(ScopeMetrics {
            total_tasks: tasks.total_tasks,
            completed_tasks: tasks.completed_tasks,
            tasks_on_time: tasks.tasks_on_time,
            high_risks: risks.high_risks,
            medium_risks: risks.medium_risks,
            low_risks: risks.low_risks,
            mitigated_risks: risks.mitigated_risks,
        })
    }

    /// Probe the upstream API. Used by the readiness handler.
    pub async fn health_check(&self) -> Result<(), ComplianceApiError> {
        let endpoint = "/health";
        let url = self.endpoint_url(endpoint)?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| ComplianceApiError::Unreachable {
                endpoint: endpoint.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(ComplianceApiError::Http {
                endpoint: endpoint.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }

    fn endpoint_url(&self, path: &str) -> Result<Url, ComplianceApiError> {
        self.base_url.join(path).map_err(|e| {
            ComplianceApiError::Decode {
                endpoint: path.to_string(),
                message: format!("invalid endpoint URL: {e}"),
            }
        })
    }

    async fn get_counts<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        scope: &Scope,
    ) -> Result<T, ComplianceApiError> {
        let mut url = self.endpoint_url(path)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("userId", scope.user_id.as_str());
            if let Some(framework) = scope.framework {
                query.append_pair("frameworkId", framework.as_str());
            }
        }

        tracing::debug!(endpoint = path, scope = %scope, "querying compliance API");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| ComplianceApiError::Unreachable {
                endpoint: path.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ComplianceApiError::Http {
                endpoint: path.to_string(),
                status: status.as_u16(),
            });
        }

        response.json::<T>().await.map_err(|e| ComplianceApiError::Decode {
            endpoint: path.to_string(),
            message: e.to_string(),
        })
    }
}
