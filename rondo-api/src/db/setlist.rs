//! Setlist items and ordered-list reconciliation
//!
//! A round owns an ordered list of items, one per song. Positions are
//! zero-based, unique, and dense within a round; every mutation path in this
//! module leaves them that way. Reordering runs as a single transaction that
//! reconciles the stored list against the caller's desired order: items for
//! songs that dropped out are deleted, surviving items are renumbered, and
//! items for newly added songs are created at their target position.

use rondo_common::db::RoundItem;
use rondo_common::{Error, Result};
use sqlx::{Pool, Sqlite};
use std::collections::{HashMap, HashSet};
use tracing::debug;
use uuid::Uuid;

/// Counts of the changes a reconcile applied. A repeat call with the same
/// desired order reports all zeros.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileOutcome {
    pub deleted: usize,
    pub repositioned: usize,
    pub created: usize,
}

/// Bring a round's stored item list into alignment with `desired_song_ids`.
///
/// One transaction, three phases: load the current items, partition them
/// against the desired order, then apply deletes, position updates, and
/// creates. After commit, reading the items back ordered by position yields
/// exactly the desired songs with positions `0..n-1`. If anything fails the
/// whole operation rolls back.
///
/// Duplicate song ids in the input collapse to their first occurrence. Songs
/// that do not exist, or belong to a different group than the round, abort
/// the call with a single aggregate NotFound.
pub async fn reconcile(
    db: &Pool<Sqlite>,
    round_guid: &str,
    desired_song_ids: &[String],
) -> Result<ReconcileOutcome> {
    let desired = dedup_first_occurrence(desired_song_ids);

    let mut tx = db.begin().await?;

    let round: Option<(String,)> = sqlx::query_as("SELECT group_guid FROM rounds WHERE guid = ?")
        .bind(round_guid)
        .fetch_optional(&mut *tx)
        .await?;

    let Some((group_guid,)) = round else {
        return Err(Error::NotFound(format!("round {}", round_guid)));
    };

    // Validate every referenced song up front so the failure is a single
    // aggregate NotFound rather than a partial application.
    let mut missing = Vec::new();
    for song_guid in &desired {
        let found: Option<(String,)> =
            sqlx::query_as("SELECT guid FROM songs WHERE guid = ? AND group_guid = ?")
                .bind(song_guid)
                .bind(&group_guid)
                .fetch_optional(&mut *tx)
                .await?;
        if found.is_none() {
            missing.push(song_guid.clone());
        }
    }
    if !missing.is_empty() {
        return Err(Error::NotFound(format!("songs {}", missing.join(", "))));
    }

    // Phase 1: load the current items
    let current: Vec<(String, String, i64)> =
        sqlx::query_as("SELECT guid, song_guid, position FROM round_items WHERE round_guid = ?")
            .bind(round_guid)
            .fetch_all(&mut *tx)
            .await?;

    // Phase 2: partition into delete / keep / create
    let desired_set: HashSet<&str> = desired.iter().map(String::as_str).collect();
    let existing: HashMap<&str, (&str, i64)> = current
        .iter()
        .map(|(item_guid, song_guid, position)| {
            (song_guid.as_str(), (item_guid.as_str(), *position))
        })
        .collect();

    let mut outcome = ReconcileOutcome::default();

    // Phase 3: apply, deletes first
    for (item_guid, song_guid, _) in &current {
        if !desired_set.contains(song_guid.as_str()) {
            sqlx::query("DELETE FROM round_items WHERE guid = ?")
                .bind(item_guid)
                .execute(&mut *tx)
                .await?;
            outcome.deleted += 1;
        }
    }

    for (index, song_guid) in desired.iter().enumerate() {
        let position = index as i64;
        match existing.get(song_guid.as_str()) {
            Some((item_guid, old_position)) => {
                if *old_position != position {
                    sqlx::query(
                        "UPDATE round_items SET position = ?, updated_at = CURRENT_TIMESTAMP
                         WHERE guid = ?",
                    )
                    .bind(position)
                    .bind(item_guid)
                    .execute(&mut *tx)
                    .await?;
                    outcome.repositioned += 1;
                }
            }
            None => {
                sqlx::query(
                    "INSERT INTO round_items (guid, round_guid, song_guid, position, notes)
                     VALUES (?, ?, ?, ?, NULL)",
                )
                .bind(Uuid::new_v4().to_string())
                .bind(round_guid)
                .bind(song_guid)
                .bind(position)
                .execute(&mut *tx)
                .await?;
                outcome.created += 1;
            }
        }
    }

    tx.commit().await?;

    debug!(
        "Reconciled round {}: {} deleted, {} repositioned, {} created",
        round_guid, outcome.deleted, outcome.repositioned, outcome.created
    );
    Ok(outcome)
}

/// Add a song to a round.
///
/// With an explicit position the new item is spliced in and trailing items
/// shift up by one; without one it appends after the current last item. A
/// (round, song) pair may exist at most once - a duplicate add is a Conflict.
pub async fn add_song(
    db: &Pool<Sqlite>,
    round_guid: &str,
    song_guid: &str,
    position: Option<i64>,
    notes: Option<&str>,
) -> Result<RoundItem> {
    if let Some(position) = position {
        if position < 0 {
            return Err(Error::InvalidInput("position must be non-negative".to_string()));
        }
    }

    let mut tx = db.begin().await?;

    let round: Option<(String,)> = sqlx::query_as("SELECT group_guid FROM rounds WHERE guid = ?")
        .bind(round_guid)
        .fetch_optional(&mut *tx)
        .await?;

    let Some((group_guid,)) = round else {
        return Err(Error::NotFound(format!("round {}", round_guid)));
    };

    let song: Option<(String,)> =
        sqlx::query_as("SELECT guid FROM songs WHERE guid = ? AND group_guid = ?")
            .bind(song_guid)
            .bind(&group_guid)
            .fetch_optional(&mut *tx)
            .await?;

    if song.is_none() {
        return Err(Error::NotFound(format!("song {}", song_guid)));
    }

    let duplicate: Option<(String,)> =
        sqlx::query_as("SELECT guid FROM round_items WHERE round_guid = ? AND song_guid = ?")
            .bind(round_guid)
            .bind(song_guid)
            .fetch_optional(&mut *tx)
            .await?;

    if duplicate.is_some() {
        return Err(Error::Conflict(format!(
            "song {} is already in round {}",
            song_guid, round_guid
        )));
    }

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM round_items WHERE round_guid = ?")
        .bind(round_guid)
        .fetch_one(&mut *tx)
        .await?;

    // Splice position is capped at the append slot
    let position = position.map(|p| p.min(count)).unwrap_or(count);

    if position < count {
        sqlx::query(
            "UPDATE round_items SET position = position + 1, updated_at = CURRENT_TIMESTAMP
             WHERE round_guid = ? AND position >= ?",
        )
        .bind(round_guid)
        .bind(position)
        .execute(&mut *tx)
        .await?;
    }

    let item_guid = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO round_items (guid, round_guid, song_guid, position, notes)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&item_guid)
    .bind(round_guid)
    .bind(song_guid)
    .bind(position)
    .bind(notes)
    .execute(&mut *tx)
    .await?;

    let item = sqlx::query_as::<_, RoundItem>(
        "SELECT guid, round_guid, song_guid, position, notes, created_at, updated_at
         FROM round_items WHERE guid = ?",
    )
    .bind(&item_guid)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    debug!("Added song {} to round {} at position {}", song_guid, round_guid, position);
    Ok(item)
}

/// Remove a song from a round. Absence is a no-op (Ok(false)), not an
/// error. Trailing items are renumbered in the same transaction so the
/// dense-position invariant holds after single removals too.
pub async fn remove_song(db: &Pool<Sqlite>, round_guid: &str, song_guid: &str) -> Result<bool> {
    let mut tx = db.begin().await?;

    let round: Option<(String,)> = sqlx::query_as("SELECT guid FROM rounds WHERE guid = ?")
        .bind(round_guid)
        .fetch_optional(&mut *tx)
        .await?;

    if round.is_none() {
        return Err(Error::NotFound(format!("round {}", round_guid)));
    }

    let item: Option<(String, i64)> = sqlx::query_as(
        "SELECT guid, position FROM round_items WHERE round_guid = ? AND song_guid = ?",
    )
    .bind(round_guid)
    .bind(song_guid)
    .fetch_optional(&mut *tx)
    .await?;

    let Some((item_guid, removed_position)) = item else {
        return Ok(false);
    };

    sqlx::query("DELETE FROM round_items WHERE guid = ?")
        .bind(&item_guid)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "UPDATE round_items SET position = position - 1, updated_at = CURRENT_TIMESTAMP
         WHERE round_guid = ? AND position > ?",
    )
    .bind(round_guid)
    .bind(removed_position)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    debug!("Removed song {} from round {}", song_guid, round_guid);
    Ok(true)
}

/// All items of a round ordered by position
pub async fn list_items(db: &Pool<Sqlite>, round_guid: &str) -> Result<Vec<RoundItem>> {
    let items = sqlx::query_as::<_, RoundItem>(
        "SELECT guid, round_guid, song_guid, position, notes, created_at, updated_at
         FROM round_items WHERE round_guid = ? ORDER BY position ASC",
    )
    .bind(round_guid)
    .fetch_all(db)
    .await?;

    Ok(items)
}

/// Drop duplicate ids, keeping the first occurrence of each
fn dedup_first_occurrence(ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_keeps_first_occurrence_order() {
        let ids = vec![
            "a".to_string(),
            "b".to_string(),
            "a".to_string(),
            "c".to_string(),
            "b".to_string(),
        ];
        assert_eq!(dedup_first_occurrence(&ids), vec!["a", "b", "c"]);
    }

    #[test]
    fn dedup_of_empty_input_is_empty() {
        assert!(dedup_first_occurrence(&[]).is_empty());
    }
}
