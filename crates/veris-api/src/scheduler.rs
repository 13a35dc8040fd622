//! # Background Recompute Sweep
//!
//! Periodically recalculates every scope that already has score history,
//! so dashboards stay current even when no task events arrive. Disabled
//! unless `VERIS_RECOMPUTE_INTERVAL_SECS` is set.

use std::time::Duration;

use veris_core::ScoreTrigger;

use crate::aggregator::calculate_and_record;
use crate::state::AppState;

/// Read the sweep interval from `VERIS_RECOMPUTE_INTERVAL_SECS`.
///
/// Returns `None` when the variable is absent or unparsable; zero is
/// treated as disabled.
pub fn interval_from_env() -> Option<Duration> {
    let raw = std::env::var("VERIS_RECOMPUTE_INTERVAL_SECS").ok()?;
    match raw.parse::<u64>() {
        Ok(0) => None,
        Ok(secs) => Some(Duration::from_secs(secs)),
        Err(_) => {
            tracing::warn!(value = %raw, "invalid VERIS_RECOMPUTE_INTERVAL_SECS — sweep disabled");
            None
        }
    }
}

/// Spawn the recompute sweep if an interval is configured.
pub fn spawn(state: AppState) -> Option<tokio::task::JoinHandle<()>> {
    let interval = interval_from_env()?;
    tracing::info!(interval_secs = interval.as_secs(), "recompute sweep enabled");
    Some(tokio::spawn(run(state, interval)))
}

/// Sweep loop. The first tick fires after one full interval.
async fn run(state: AppState, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        ticker.tick().await;
        sweep(&state).await;
    }
}

/// Recalculate every scope with existing history.
///
/// Per-scope failures are logged and skipped; one unreachable upstream
/// scope must not starve the rest of the sweep.
pub async fn sweep(state: &AppState) {
    let scopes = state.snapshots.scopes();
    if scopes.is_empty() {
        return;
    }
    tracing::debug!(scopes = scopes.len(), "recompute sweep started");

    let mut failed = 0usize;
    for scope in &scopes {
        if let Err(err) = calculate_and_record(state, scope, ScoreTrigger::Scheduled).await {
            failed += 1;
            tracing::warn!(scope = %scope, error = %err, "scheduled recalculation failed");
        }
    }

    tracing::info!(
        scopes = scopes.len(),
        failed,
        "recompute sweep finished"
    );
}
