//! Settings database access
//!
//! Read/write settings from the settings table (key-value store).
//! All settings are global/system-wide (not user-specific).

use rondo_common::{Error, Result};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;

/// Comma-separated reminder lead times (minutes before a performance)
pub async fn reminder_lead_minutes(db: &Pool<Sqlite>) -> Result<Vec<i64>> {
    let raw = match get_setting::<String>(db, "reminder_lead_minutes").await? {
        Some(value) => value,
        None => {
            let default = "1440,60".to_string();
            set_setting(db, "reminder_lead_minutes", default.clone()).await?;
            default
        }
    };

    let mut leads = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let minutes = part
            .parse::<i64>()
            .map_err(|e| Error::Config(format!("Invalid reminder_lead_minutes entry: {}", e)))?;
        if minutes < 0 {
            return Err(Error::Config(
                "reminder_lead_minutes entries must be non-negative".to_string(),
            ));
        }
        leads.push(minutes);
    }

    Ok(leads)
}

/// Invitation validity window in hours
pub async fn invitation_ttl_hours(db: &Pool<Sqlite>) -> Result<i64> {
    match get_setting::<i64>(db, "invitation_ttl_hours").await? {
        Some(hours) => Ok(hours),
        None => {
            set_setting(db, "invitation_ttl_hours", 168i64).await?;
            Ok(168)
        }
    }
}

/// Get a typed setting value, None when the key is absent
pub async fn get_setting<T: FromStr>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>> {
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await?;

    match row {
        Some((value,)) => match value.parse::<T>() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(Error::Config(format!(
                "Setting '{}' has unparseable value '{}'",
                key, value
            ))),
        },
        None => Ok(None),
    }
}

/// Write a setting value (insert or replace)
pub async fn set_setting<T: ToString>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()> {
    sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)")
        .bind(key)
        .bind(value.to_string())
        .execute(db)
        .await?;

    Ok(())
}
