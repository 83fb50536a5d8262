//! Performance (scheduled event) queries
//!
//! Creating or rescheduling a performance recomputes its reminder rows in
//! the same transaction, so the calendar and the reminder feed never
//! disagree.

use rondo_common::db::Performance;
use rondo_common::{Error, Result};
use sqlx::{Pool, Sqlite};
use tracing::debug;
use uuid::Uuid;

/// Mutable performance attributes, shared by create and update
#[derive(Debug, Clone, Default)]
pub struct PerformanceDraft {
    pub round_guid: Option<String>,
    pub venue: String,
    pub starts_at: String,
    pub notes: Option<String>,
}

impl PerformanceDraft {
    fn validate(&self) -> Result<()> {
        if self.venue.trim().is_empty() {
            return Err(Error::InvalidInput("venue must not be empty".to_string()));
        }
        chrono::DateTime::parse_from_rfc3339(&self.starts_at)
            .map_err(|e| Error::InvalidInput(format!("Invalid starts_at: {}", e)))?;
        Ok(())
    }
}

/// Schedule a performance and materialize its reminders
pub async fn create_performance(
    db: &Pool<Sqlite>,
    group_guid: &str,
    draft: &PerformanceDraft,
    lead_minutes: &[i64],
) -> Result<Performance> {
    draft.validate()?;

    let guid = Uuid::new_v4().to_string();

    let mut tx = db.begin().await?;

    check_round_in_group(&mut tx, draft.round_guid.as_deref(), group_guid).await?;

    sqlx::query(
        r#"
        INSERT INTO performances (guid, group_guid, round_guid, venue, starts_at, notes)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&guid)
    .bind(group_guid)
    .bind(&draft.round_guid)
    .bind(&draft.venue)
    .bind(&draft.starts_at)
    .bind(&draft.notes)
    .execute(&mut *tx)
    .await?;

    crate::db::reminders::reschedule_in_tx(&mut tx, &guid, &draft.starts_at, lead_minutes).await?;

    tx.commit().await?;

    debug!("Scheduled performance {} in group {}", guid, group_guid);
    get_performance(db, &guid).await
}

/// Fetch a performance by guid
pub async fn get_performance(db: &Pool<Sqlite>, guid: &str) -> Result<Performance> {
    sqlx::query_as::<_, Performance>(
        "SELECT guid, group_guid, round_guid, venue, starts_at, notes, created_at, updated_at
         FROM performances WHERE guid = ?",
    )
    .bind(guid)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| Error::NotFound(format!("performance {}", guid)))
}

/// A group's performances in calendar order
pub async fn list_performances(db: &Pool<Sqlite>, group_guid: &str) -> Result<Vec<Performance>> {
    let performances = sqlx::query_as::<_, Performance>(
        "SELECT guid, group_guid, round_guid, venue, starts_at, notes, created_at, updated_at
         FROM performances WHERE group_guid = ? ORDER BY starts_at ASC",
    )
    .bind(group_guid)
    .fetch_all(db)
    .await?;

    Ok(performances)
}

/// Update a performance; reminders are recomputed from the (possibly new)
/// start time
pub async fn update_performance(
    db: &Pool<Sqlite>,
    guid: &str,
    draft: &PerformanceDraft,
    lead_minutes: &[i64],
) -> Result<Performance> {
    draft.validate()?;

    let mut tx = db.begin().await?;

    let existing: Option<(String,)> =
        sqlx::query_as("SELECT group_guid FROM performances WHERE guid = ?")
            .bind(guid)
            .fetch_optional(&mut *tx)
            .await?;

    let Some((group_guid,)) = existing else {
        return Err(Error::NotFound(format!("performance {}", guid)));
    };

    check_round_in_group(&mut tx, draft.round_guid.as_deref(), &group_guid).await?;

    sqlx::query(
        r#"
        UPDATE performances
        SET round_guid = ?, venue = ?, starts_at = ?, notes = ?, updated_at = CURRENT_TIMESTAMP
        WHERE guid = ?
        "#,
    )
    .bind(&draft.round_guid)
    .bind(&draft.venue)
    .bind(&draft.starts_at)
    .bind(&draft.notes)
    .bind(guid)
    .execute(&mut *tx)
    .await?;

    crate::db::reminders::reschedule_in_tx(&mut tx, guid, &draft.starts_at, lead_minutes).await?;

    tx.commit().await?;

    get_performance(db, guid).await
}

/// Cancel a performance; reminder rows cascade away
pub async fn delete_performance(db: &Pool<Sqlite>, guid: &str) -> Result<()> {
    let deleted = sqlx::query("DELETE FROM performances WHERE guid = ?")
        .bind(guid)
        .execute(db)
        .await?;

    if deleted.rows_affected() == 0 {
        return Err(Error::NotFound(format!("performance {}", guid)));
    }

    debug!("Deleted performance {}", guid);
    Ok(())
}

/// A setlist reference must point at a round in the same group
async fn check_round_in_group(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    round_guid: Option<&str>,
    group_guid: &str,
) -> Result<()> {
    let Some(round_guid) = round_guid else {
        return Ok(());
    };

    let round: Option<(String,)> =
        sqlx::query_as("SELECT guid FROM rounds WHERE guid = ? AND group_guid = ?")
            .bind(round_guid)
            .bind(group_guid)
            .fetch_optional(&mut **tx)
            .await?;

    if round.is_none() {
        return Err(Error::NotFound(format!("round {}", round_guid)));
    }

    Ok(())
}
