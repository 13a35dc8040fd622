//! Service entry point: wires config, persistence, the optional
//! upstream client, and the background sweep, then serves the API.

use veris_api::state::{AppConfig, AppState};
use veris_core::{ScoreWeights, DEFAULT_TREND_THRESHOLD};

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

/// Parse an env var, falling back to `default` when unset or malformed.
fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = AppConfig {
        port: env_parsed("PORT", 8080),
        trend_threshold: env_parsed("VERIS_TREND_THRESHOLD", DEFAULT_TREND_THRESHOLD),
        weights: ScoreWeights::default(),
    };
    let port = config.port;

    let db_pool = veris_api::db::init_pool().await.map_err(|e| {
        tracing::error!("Database initialization failed: {e}");
        e
    })?;

    let upstream = match veris_client::ComplianceApiConfig::from_env() {
        Ok(client_config) => {
            let client = veris_client::ComplianceClient::new(client_config).map_err(|e| {
                tracing::error!("Failed to create compliance data client: {e}");
                e
            })?;
            tracing::info!("Compliance data client configured");
            Some(client)
        }
        Err(e) => {
            tracing::warn!(
                "Compliance data client not configured: {e}. \
                 Scoring will aggregate from locally synced mirrors."
            );
            None
        }
    };

    let state = AppState::with_config(config, upstream, db_pool);
    state.hydrate_from_db().await.map_err(|e| {
        tracing::error!("Database hydration failed: {e}");
        e
    })?;

    let _sweep = veris_api::scheduler::spawn(state.clone());

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "Veris API listening");
    axum::serve(listener, veris_api::app(state)).await?;

    Ok(())
}
