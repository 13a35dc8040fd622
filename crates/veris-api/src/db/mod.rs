//! # Snapshot Persistence
//!
//! Postgres-backed storage for the append-only score history, via SQLx.
//! Persistence is optional: with `DATABASE_URL` set, every snapshot is
//! written through and history survives restarts; without it the service
//! keeps history in memory only, which is fine for development and tests.
//!
//! Task and risk records are never stored here. They are owned by the
//! upstream compliance service (or by the in-memory mirrors fed through
//! the sync endpoints).

pub mod snapshots;

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

const DEFAULT_MAX_CONNECTIONS: u32 = 20;

fn max_connections() -> u32 {
    std::env::var("DATABASE_MAX_CONNECTIONS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_MAX_CONNECTIONS)
}

/// Connect to Postgres and apply embedded migrations.
///
/// `Ok(None)` means `DATABASE_URL` is unset and the caller should run
/// without persistence. A set-but-unreachable database is an error, not
/// a silent fallback.
pub async fn init_pool() -> Result<Option<PgPool>, sqlx::Error> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        tracing::warn!(
            "DATABASE_URL not set — score history is in-memory only and will not survive restarts"
        );
        return Ok(None);
    };

    let pool = PgPoolOptions::new()
        .max_connections(max_connections())
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&url)
        .await?;
    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}
