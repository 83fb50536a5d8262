//! Manual schema migrations
//!
//! `CREATE TABLE IF NOT EXISTS` handles fresh installs; migrations handle
//! transformations of existing databases (column additions, data rewrites).
//! Each migration runs at most once, tracked in `schema_version`.

use crate::Result;
use sqlx::SqlitePool;
use tracing::info;

/// Current schema version expected by this build
pub const SCHEMA_VERSION: i64 = 1;

/// Read the highest applied schema version (0 for a brand-new database)
pub async fn get_schema_version(pool: &SqlitePool) -> Result<i64> {
    let version: Option<(i64,)> =
        sqlx::query_as("SELECT MAX(version) FROM schema_version WHERE version IS NOT NULL")
            .fetch_optional(pool)
            .await?;

    Ok(version.map(|(v,)| v).unwrap_or(0))
}

async fn record_version(pool: &SqlitePool, version: i64) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

/// Apply all pending migrations in order
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current = get_schema_version(pool).await?;

    if current < 1 {
        // Version 1 is the baseline schema created by init_schema; nothing
        // to transform, just stamp it.
        record_version(pool, 1).await?;
        info!("Schema stamped at version 1");
    }

    Ok(())
}
