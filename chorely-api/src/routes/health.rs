/// Health check endpoint
///
/// ```text
/// GET /health
/// ```
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected",
///   "latency_ms": 2,
///   "pool": { "active_connections": 1, "idle_connections": 2, "total_connections": 3 },
///   "migrations": { "applied_migrations": 1, "known_migrations": 1, "latest_version": 20240101000001 }
/// }
/// ```
///
/// A failed database round-trip reports `"degraded"` / `"disconnected"` with
/// status 200, so the endpoint stays usable as a liveness probe.

use crate::app::AppState;
use axum::{extract::State, Json};
use chorely_shared::db::{
    migrations::{get_migration_status, MigrationStatus},
    pool::{health_check as ping, pool_stats, PoolStats},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,

    pub pool: PoolStats,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub migrations: Option<MigrationStatus>,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let (database, latency_ms, migrations) = match ping(&state.db).await {
        Ok(latency) => {
            let migrations = get_migration_status(&state.db)
                .await
                .map_err(|e| tracing::warn!(error = %e, "Failed to read migration status"))
                .ok();
            ("connected", Some(latency.as_millis() as u64), migrations)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            ("disconnected", None, None)
        }
    };

    Json(HealthResponse {
        status: if latency_ms.is_some() { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        database,
        latency_ms,
        pool: pool_stats(&state.db),
        migrations,
    })
}
