//! Database initialization
//!
//! Creates the database on first run and brings the schema up to date on
//! every start. All table creation is idempotent (`CREATE TABLE IF NOT
//! EXISTS`) so a fresh install and a restart go through the same path.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Use sqlite options to create database if it doesn't exist
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    init_schema(&pool).await?;

    Ok(pool)
}

/// Create an in-memory database with the full schema. Used by tests and by
/// tooling that needs a throwaway store.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    init_schema(&pool).await?;

    Ok(pool)
}

/// Apply pragmas, create all tables, run migrations, seed default settings
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    // WAL allows concurrent readers with one writer
    sqlx::query("PRAGMA journal_mode = WAL").execute(pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(pool).await?;

    // Run migrations (idempotent - safe to call multiple times)
    create_schema_version_table(pool).await?;
    create_users_table(pool).await?;
    create_sessions_table(pool).await?;
    create_settings_table(pool).await?;

    // Tenant tables
    create_groups_table(pool).await?;
    create_group_members_table(pool).await?;
    create_invitations_table(pool).await?;

    // Library and setlist tables
    create_songs_table(pool).await?;
    create_rounds_table(pool).await?;
    create_round_items_table(pool).await?;

    // Scheduling tables
    create_performances_table(pool).await?;
    create_performance_reminders_table(pool).await?;

    // Manual migrations for transformations CREATE TABLE IF NOT EXISTS
    // cannot express
    crate::db::migrations::run_migrations(pool).await?;

    // Initialize default settings
    init_default_settings(pool).await?;

    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            guid TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            display_name TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_sessions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            token_hash TEXT PRIMARY KEY,
            user_guid TEXT NOT NULL REFERENCES users(guid) ON DELETE CASCADE,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            expires_at TEXT NOT NULL,
            CHECK (length(token_hash) = 64)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_guid)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_groups_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS groups (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_group_members_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS group_members (
            group_guid TEXT NOT NULL REFERENCES groups(guid) ON DELETE CASCADE,
            user_guid TEXT NOT NULL REFERENCES users(guid) ON DELETE CASCADE,
            role TEXT NOT NULL CHECK (role IN ('owner', 'admin', 'member')),
            joined_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (group_guid, user_guid)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_group_members_user ON group_members(user_guid)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_invitations_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS invitations (
            guid TEXT PRIMARY KEY,
            group_guid TEXT NOT NULL REFERENCES groups(guid) ON DELETE CASCADE,
            email TEXT NOT NULL,
            role TEXT NOT NULL CHECK (role IN ('admin', 'member')),
            code TEXT NOT NULL UNIQUE,
            invited_by TEXT NOT NULL REFERENCES users(guid),
            status TEXT NOT NULL DEFAULT 'pending'
                CHECK (status IN ('pending', 'accepted', 'declined', 'revoked')),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            expires_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_invitations_group ON invitations(group_guid)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_invitations_code ON invitations(code)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_songs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS songs (
            guid TEXT PRIMARY KEY,
            group_guid TEXT NOT NULL REFERENCES groups(guid) ON DELETE CASCADE,
            title TEXT NOT NULL,
            lyrics TEXT,
            genre TEXT,
            key_signature TEXT,
            favorite INTEGER NOT NULL DEFAULT 0 CHECK (favorite IN (0, 1)),
            tuning TEXT,
            capo INTEGER,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (capo IS NULL OR capo >= 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_songs_group ON songs(group_guid)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_songs_title ON songs(title)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_rounds_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS rounds (
            guid TEXT PRIMARY KEY,
            group_guid TEXT NOT NULL REFERENCES groups(guid) ON DELETE CASCADE,
            name TEXT NOT NULL,
            description TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_rounds_group ON rounds(group_guid)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_round_items_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS round_items (
            guid TEXT PRIMARY KEY,
            round_guid TEXT NOT NULL REFERENCES rounds(guid) ON DELETE CASCADE,
            song_guid TEXT NOT NULL REFERENCES songs(guid) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            notes TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (round_guid, song_guid),
            CHECK (position >= 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_round_items_order ON round_items(round_guid, position)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_performances_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS performances (
            guid TEXT PRIMARY KEY,
            group_guid TEXT NOT NULL REFERENCES groups(guid) ON DELETE CASCADE,
            round_guid TEXT REFERENCES rounds(guid) ON DELETE SET NULL,
            venue TEXT NOT NULL,
            starts_at TEXT NOT NULL,
            notes TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_performances_group ON performances(group_guid)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_performances_starts ON performances(starts_at)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_performance_reminders_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS performance_reminders (
            guid TEXT PRIMARY KEY,
            performance_guid TEXT NOT NULL REFERENCES performances(guid) ON DELETE CASCADE,
            remind_at TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_performance_reminders_due ON performance_reminders(remind_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Initialize default settings if not present
async fn init_default_settings(pool: &SqlitePool) -> Result<()> {
    ensure_setting(pool, "session_ttl_hours", "720").await?;
    ensure_setting(pool, "invitation_ttl_hours", "168").await?;
    // Comma-separated minutes before a performance at which reminders fire
    ensure_setting(pool, "reminder_lead_minutes", "1440,60").await?;
    ensure_setting(pool, "listen_host", "127.0.0.1").await?;
    ensure_setting(pool, "listen_port", "5740").await?;

    Ok(())
}

/// Insert a setting only if the key is absent, preserving user overrides
pub async fn ensure_setting(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
        .bind(key)
        .bind(value)
        .execute(pool)
        .await?;

    Ok(())
}
