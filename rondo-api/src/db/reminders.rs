//! Performance reminder computation and queries
//!
//! Reminder rows are materialized whenever a performance is created or its
//! start time changes; there is no scheduler loop here. Delivery is an
//! external collaborator that polls [`due_before`].

use rondo_common::db::PerformanceReminder;
use rondo_common::{Error, Result};
use serde::Serialize;
use sqlx::{Pool, Sqlite, Transaction};
use uuid::Uuid;

/// Reminder joined with its performance, for the due-reminder feed
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DueReminder {
    pub guid: String,
    pub performance_guid: String,
    pub remind_at: String,
    pub venue: String,
    pub starts_at: String,
    pub group_guid: String,
}

/// Compute reminder timestamps for a start time: one per lead, ordered
/// soonest-last-first, duplicates collapsed
pub fn compute_remind_times(starts_at: &str, lead_minutes: &[i64]) -> Result<Vec<String>> {
    let starts = chrono::DateTime::parse_from_rfc3339(starts_at)
        .map_err(|e| Error::InvalidInput(format!("Invalid starts_at: {}", e)))?
        .with_timezone(&chrono::Utc);

    let mut times: Vec<String> = lead_minutes
        .iter()
        .map(|minutes| (starts - chrono::Duration::minutes(*minutes)).to_rfc3339())
        .collect();

    times.sort();
    times.dedup();
    Ok(times)
}

/// Replace a performance's reminder rows inside an open transaction
pub async fn reschedule_in_tx(
    tx: &mut Transaction<'_, Sqlite>,
    performance_guid: &str,
    starts_at: &str,
    lead_minutes: &[i64],
) -> Result<()> {
    sqlx::query("DELETE FROM performance_reminders WHERE performance_guid = ?")
        .bind(performance_guid)
        .execute(&mut **tx)
        .await?;

    for remind_at in compute_remind_times(starts_at, lead_minutes)? {
        sqlx::query(
            "INSERT INTO performance_reminders (guid, performance_guid, remind_at)
             VALUES (?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(performance_guid)
        .bind(&remind_at)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

/// Reminders for one performance, soonest first
pub async fn list_for_performance(
    db: &Pool<Sqlite>,
    performance_guid: &str,
) -> Result<Vec<PerformanceReminder>> {
    let reminders = sqlx::query_as::<_, PerformanceReminder>(
        "SELECT guid, performance_guid, remind_at, created_at
         FROM performance_reminders WHERE performance_guid = ?
         ORDER BY remind_at ASC",
    )
    .bind(performance_guid)
    .fetch_all(db)
    .await?;

    Ok(reminders)
}

/// Reminders due before the cutoff for performances in the caller's groups
pub async fn due_before(
    db: &Pool<Sqlite>,
    user_guid: &str,
    before: &str,
) -> Result<Vec<DueReminder>> {
    // Re-serialize the cutoff so the stored and compared strings share one
    // canonical RFC 3339 form
    let before = chrono::DateTime::parse_from_rfc3339(before)
        .map_err(|e| Error::InvalidInput(format!("Invalid cutoff: {}", e)))?
        .with_timezone(&chrono::Utc)
        .to_rfc3339();

    let reminders = sqlx::query_as::<_, DueReminder>(
        r#"
        SELECT pr.guid, pr.performance_guid, pr.remind_at,
               p.venue, p.starts_at, p.group_guid
        FROM performance_reminders pr
        INNER JOIN performances p ON p.guid = pr.performance_guid
        INNER JOIN group_members gm ON gm.group_guid = p.group_guid
        WHERE gm.user_guid = ? AND pr.remind_at <= ?
        ORDER BY pr.remind_at ASC
        "#,
    )
    .bind(user_guid)
    .bind(before)
    .fetch_all(db)
    .await?;

    Ok(reminders)
}
