//! Raw aggregated metrics for a scope.
//!
//! [`ScopeMetrics`] is the aggregator's output and the calculator's input.
//! Counts are unsigned, so negative values are unrepresentable; the
//! remaining cross-field invariants are checked by [`ScopeMetrics::validate`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Aggregated inputs violate a data-integrity invariant.
///
/// This indicates a bug in the upstream task or risk store, not a caller
/// mistake. It is surfaced and logged, never silently corrected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidMetricsError {
    /// More tasks completed than exist in the scope.
    #[error("completed_tasks ({completed}) exceeds total_tasks ({total})")]
    CompletedExceedsTotal {
        /// Completed task count reported upstream.
        completed: u64,
        /// Total task count reported upstream.
        total: u64,
    },

    /// More tasks completed on time than completed at all.
    #[error("tasks_on_time ({on_time}) exceeds completed_tasks ({completed})")]
    OnTimeExceedsCompleted {
        /// On-time completion count reported upstream.
        on_time: u64,
        /// Completed task count reported upstream.
        completed: u64,
    },
}

/// Raw counts for one scope at calculation time.
///
/// The risk counts are a mutually exclusive categorization: a risk is
/// exactly one of high, medium, low (all unmitigated) or mitigated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeMetrics {
    /// Total tasks in scope.
    pub total_tasks: u64,
    /// Tasks marked complete.
    pub completed_tasks: u64,
    /// Completed tasks finished on or before their due date (or with no
    /// due date).
    pub tasks_on_time: u64,
    /// Unmitigated high-severity risks.
    pub high_risks: u64,
    /// Unmitigated medium-severity risks.
    pub medium_risks: u64,
    /// Unmitigated low-severity risks.
    pub low_risks: u64,
    /// Mitigated risks.
    pub mitigated_risks: u64,
}

impl ScopeMetrics {
    /// Check the cross-field invariants.
    pub fn validate(&self) -> Result<(), InvalidMetricsError> {
        if self.completed_tasks > self.total_tasks {
            return Err(InvalidMetricsError::CompletedExceedsTotal {
                completed: self.completed_tasks,
                total: self.total_tasks,
            });
        }
        if self.tasks_on_time > self.completed_tasks {
            return Err(InvalidMetricsError::OnTimeExceedsCompleted {
                on_time: self.tasks_on_time,
                completed: self.completed_tasks,
            });
        }
        Ok(())
    }

    /// Total number of known risks in scope, mitigated or not.
    pub fn total_risks(&self) -> u64 {
        self.high_risks + self.medium_risks + self.low_risks + self.mitigated_risks
    }
}
