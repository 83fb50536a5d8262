//! Round (setlist template) queries
//!
//! Item-level operations live in [`crate::db::setlist`]; this module covers
//! the rounds themselves.

use rondo_common::db::Round;
use rondo_common::{Error, Result};
use serde::Serialize;
use sqlx::{Pool, Sqlite};
use tracing::debug;
use uuid::Uuid;

/// Setlist item joined with song details, for the round detail view
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RoundItemDetail {
    pub song_guid: String,
    pub title: String,
    pub key_signature: Option<String>,
    pub position: i64,
    pub notes: Option<String>,
}

/// Insert a new round
pub async fn create_round(
    db: &Pool<Sqlite>,
    group_guid: &str,
    name: &str,
    description: Option<&str>,
) -> Result<Round> {
    if name.trim().is_empty() {
        return Err(Error::InvalidInput("round name must not be empty".to_string()));
    }

    let guid = Uuid::new_v4().to_string();

    sqlx::query("INSERT INTO rounds (guid, group_guid, name, description) VALUES (?, ?, ?, ?)")
        .bind(&guid)
        .bind(group_guid)
        .bind(name)
        .bind(description)
        .execute(db)
        .await?;

    debug!("Created round {} in group {}", guid, group_guid);
    get_round(db, &guid).await
}

/// Fetch a round by guid
pub async fn get_round(db: &Pool<Sqlite>, guid: &str) -> Result<Round> {
    sqlx::query_as::<_, Round>(
        "SELECT guid, group_guid, name, description, created_at, updated_at
         FROM rounds WHERE guid = ?",
    )
    .bind(guid)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| Error::NotFound(format!("round {}", guid)))
}

/// List a group's rounds, newest first
pub async fn list_rounds(db: &Pool<Sqlite>, group_guid: &str) -> Result<Vec<Round>> {
    let rounds = sqlx::query_as::<_, Round>(
        "SELECT guid, group_guid, name, description, created_at, updated_at
         FROM rounds WHERE group_guid = ? ORDER BY created_at DESC",
    )
    .bind(group_guid)
    .fetch_all(db)
    .await?;

    Ok(rounds)
}

/// Update a round's name and description
pub async fn update_round(
    db: &Pool<Sqlite>,
    guid: &str,
    name: &str,
    description: Option<&str>,
) -> Result<Round> {
    if name.trim().is_empty() {
        return Err(Error::InvalidInput("round name must not be empty".to_string()));
    }

    let updated = sqlx::query(
        "UPDATE rounds SET name = ?, description = ?, updated_at = CURRENT_TIMESTAMP
         WHERE guid = ?",
    )
    .bind(name)
    .bind(description)
    .bind(guid)
    .execute(db)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(Error::NotFound(format!("round {}", guid)));
    }

    get_round(db, guid).await
}

/// Delete a round; its items cascade away, performances referencing it keep
/// running with their setlist cleared (FK SET NULL)
pub async fn delete_round(db: &Pool<Sqlite>, guid: &str) -> Result<()> {
    let deleted = sqlx::query("DELETE FROM rounds WHERE guid = ?")
        .bind(guid)
        .execute(db)
        .await?;

    if deleted.rows_affected() == 0 {
        return Err(Error::NotFound(format!("round {}", guid)));
    }

    debug!("Deleted round {}", guid);
    Ok(())
}

/// The round's items joined with song details, ordered by position
pub async fn list_item_details(db: &Pool<Sqlite>, round_guid: &str) -> Result<Vec<RoundItemDetail>> {
    let items = sqlx::query_as::<_, RoundItemDetail>(
        r#"
        SELECT ri.song_guid, s.title, s.key_signature, ri.position, ri.notes
        FROM round_items ri
        INNER JOIN songs s ON s.guid = ri.song_guid
        WHERE ri.round_guid = ?
        ORDER BY ri.position ASC
        "#,
    )
    .bind(round_guid)
    .fetch_all(db)
    .await?;

    Ok(items)
}
