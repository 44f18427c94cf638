//! Embedded schema migrations
//!
//! SQL files live in `migrations/` at the workspace root and are compiled into
//! the binary, so the server can bring a fresh database up to date on start.

use serde::Serialize;
use sqlx::migrate::{MigrateError, Migrator};
use sqlx::postgres::PgPool;
use tracing::{debug, error, info};

/// Migrations bundled at compile time
pub static MIGRATOR: Migrator = sqlx::migrate!("../migrations");

/// Applied-migration summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    /// Migrations recorded as successful in `_sqlx_migrations`
    pub applied_migrations: usize,

    /// Migrations bundled in this binary
    pub known_migrations: usize,

    /// Highest applied version
    pub latest_version: Option<i64>,
}

impl MigrationStatus {
    pub fn is_up_to_date(&self) -> bool {
        self.applied_migrations >= self.known_migrations
    }
}

/// Applies every pending migration
///
/// Each migration runs in its own transaction; a failing migration is rolled
/// back and the error is returned.
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    info!(
        known_migrations = MIGRATOR.iter().count(),
        "Running database migrations"
    );

    MIGRATOR.run(pool).await.map_err(|e| {
        error!(error = %e, "Migration failed");
        e
    })?;

    info!("Database migrations complete");
    Ok(())
}

/// Reads the migration table and compares it with the bundled set
pub async fn get_migration_status(pool: &PgPool) -> Result<MigrationStatus, sqlx::Error> {
    let known_migrations = MIGRATOR.iter().count();

    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT FROM information_schema.tables
            WHERE table_schema = 'public' AND table_name = '_sqlx_migrations'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        debug!("Migration table does not exist yet");
        return Ok(MigrationStatus {
            applied_migrations: 0,
            known_migrations,
            latest_version: None,
        });
    }

    let (count, latest_version): (i64, Option<i64>) = sqlx::query_as(
        r#"
        SELECT COUNT(*), MAX(version)
        FROM _sqlx_migrations
        WHERE success = true
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(MigrationStatus {
        applied_migrations: count as usize,
        known_migrations,
        latest_version,
    })
}
