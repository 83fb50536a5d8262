//! Song library queries

use rondo_common::db::Song;
use rondo_common::{Error, Result};
use sqlx::{Pool, Sqlite};
use tracing::debug;
use uuid::Uuid;

/// Mutable song attributes, shared by create and update
#[derive(Debug, Clone, Default)]
pub struct SongDraft {
    pub title: String,
    pub lyrics: Option<String>,
    pub genre: Option<String>,
    pub key_signature: Option<String>,
    pub tuning: Option<String>,
    pub capo: Option<i64>,
}

impl SongDraft {
    fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::InvalidInput("song title must not be empty".to_string()));
        }
        if let Some(capo) = self.capo {
            if capo < 0 {
                return Err(Error::InvalidInput("capo must be non-negative".to_string()));
            }
        }
        Ok(())
    }
}

/// Insert a new song into a group's library
pub async fn create_song(db: &Pool<Sqlite>, group_guid: &str, draft: &SongDraft) -> Result<Song> {
    draft.validate()?;

    let guid = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO songs (guid, group_guid, title, lyrics, genre, key_signature, tuning, capo)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&guid)
    .bind(group_guid)
    .bind(&draft.title)
    .bind(&draft.lyrics)
    .bind(&draft.genre)
    .bind(&draft.key_signature)
    .bind(&draft.tuning)
    .bind(draft.capo)
    .execute(db)
    .await?;

    debug!("Created song {} in group {}", guid, group_guid);
    get_song(db, &guid).await
}

/// Fetch a song by guid
pub async fn get_song(db: &Pool<Sqlite>, guid: &str) -> Result<Song> {
    sqlx::query_as::<_, Song>(
        r#"
        SELECT guid, group_guid, title, lyrics, genre, key_signature, favorite,
               tuning, capo, created_at, updated_at
        FROM songs WHERE guid = ?
        "#,
    )
    .bind(guid)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| Error::NotFound(format!("song {}", guid)))
}

/// List a group's songs, optionally filtered to favorites or a title search
pub async fn list_songs(
    db: &Pool<Sqlite>,
    group_guid: &str,
    favorites_only: bool,
    title_search: Option<&str>,
) -> Result<Vec<Song>> {
    let mut sql = String::from(
        r#"
        SELECT guid, group_guid, title, lyrics, genre, key_signature, favorite,
               tuning, capo, created_at, updated_at
        FROM songs WHERE group_guid = ?
        "#,
    );
    if favorites_only {
        sql.push_str(" AND favorite = 1");
    }
    if title_search.is_some() {
        sql.push_str(" AND title LIKE ? COLLATE NOCASE");
    }
    sql.push_str(" ORDER BY title COLLATE NOCASE");

    let mut query = sqlx::query_as::<_, Song>(&sql).bind(group_guid);
    if let Some(search) = title_search {
        query = query.bind(format!("%{}%", search));
    }

    Ok(query.fetch_all(db).await?)
}

/// Update a song's attributes
pub async fn update_song(db: &Pool<Sqlite>, guid: &str, draft: &SongDraft) -> Result<Song> {
    draft.validate()?;

    let updated = sqlx::query(
        r#"
        UPDATE songs
        SET title = ?, lyrics = ?, genre = ?, key_signature = ?, tuning = ?, capo = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE guid = ?
        "#,
    )
    .bind(&draft.title)
    .bind(&draft.lyrics)
    .bind(&draft.genre)
    .bind(&draft.key_signature)
    .bind(&draft.tuning)
    .bind(draft.capo)
    .bind(guid)
    .execute(db)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(Error::NotFound(format!("song {}", guid)));
    }

    get_song(db, guid).await
}

/// Flip the favorite flag, returning the updated song
pub async fn toggle_favorite(db: &Pool<Sqlite>, guid: &str) -> Result<Song> {
    let updated = sqlx::query(
        "UPDATE songs SET favorite = NOT favorite, updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
    )
    .bind(guid)
    .execute(db)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(Error::NotFound(format!("song {}", guid)));
    }

    get_song(db, guid).await
}

/// Delete a song. Setlist items referencing it cascade away, and every
/// affected round is renumbered so positions stay dense.
pub async fn delete_song(db: &Pool<Sqlite>, guid: &str) -> Result<()> {
    let mut tx = db.begin().await?;

    let vacated: Vec<(String, i64)> =
        sqlx::query_as("SELECT round_guid, position FROM round_items WHERE song_guid = ?")
            .bind(guid)
            .fetch_all(&mut *tx)
            .await?;

    let deleted = sqlx::query("DELETE FROM songs WHERE guid = ?")
        .bind(guid)
        .execute(&mut *tx)
        .await?;

    if deleted.rows_affected() == 0 {
        return Err(Error::NotFound(format!("song {}", guid)));
    }

    for (round_guid, position) in &vacated {
        sqlx::query(
            "UPDATE round_items SET position = position - 1, updated_at = CURRENT_TIMESTAMP
             WHERE round_guid = ? AND position > ?",
        )
        .bind(round_guid)
        .bind(position)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    debug!("Deleted song {}", guid);
    Ok(())
}
