//! Song library endpoints

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use rondo_common::api::auth::AuthenticatedUser;
use rondo_common::db::{Role, Song};
use rondo_common::RondoEvent;
use serde::Deserialize;
use tracing::info;

use super::ApiError;
use crate::db::songs::{self, SongDraft};
use crate::db::groups;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SongRequest {
    pub title: String,
    pub lyrics: Option<String>,
    pub genre: Option<String>,
    pub key_signature: Option<String>,
    pub tuning: Option<String>,
    pub capo: Option<i64>,
}

impl SongRequest {
    fn into_draft(self) -> SongDraft {
        SongDraft {
            title: self.title.trim().to_string(),
            lyrics: self.lyrics,
            genre: self.genre,
            key_signature: self.key_signature,
            tuning: self.tuning,
            capo: self.capo,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SongListQuery {
    /// Restrict to favorites when true
    #[serde(default)]
    pub favorite: bool,
    /// Case-insensitive title substring
    pub search: Option<String>,
}

/// POST /groups/:group_id/songs - add a song to the library
pub async fn create_song(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(group_id): Path<String>,
    Json(req): Json<SongRequest>,
) -> Result<(StatusCode, Json<Song>), ApiError> {
    groups::require_role(&state.db, &group_id, &user.guid, Role::Member).await?;

    let song = songs::create_song(&state.db, &group_id, &req.into_draft()).await?;

    state.broadcast_event(RondoEvent::SongCreated {
        song_id: song.guid.clone(),
        group_id: group_id.clone(),
        timestamp: chrono::Utc::now(),
    });

    info!("User {} created song {} in group {}", user.guid, song.guid, group_id);
    Ok((StatusCode::CREATED, Json(song)))
}

/// GET /groups/:group_id/songs - list the library
pub async fn list_songs(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(group_id): Path<String>,
    Query(query): Query<SongListQuery>,
) -> Result<Json<Vec<Song>>, ApiError> {
    groups::require_role(&state.db, &group_id, &user.guid, Role::Member).await?;

    let list = songs::list_songs(
        &state.db,
        &group_id,
        query.favorite,
        query.search.as_deref(),
    )
    .await?;

    Ok(Json(list))
}

/// GET /songs/:song_id
pub async fn get_song(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(song_id): Path<String>,
) -> Result<Json<Song>, ApiError> {
    let song = songs::get_song(&state.db, &song_id).await?;
    groups::require_role(&state.db, &song.group_guid, &user.guid, Role::Member).await?;

    Ok(Json(song))
}

/// PUT /songs/:song_id - update attributes
pub async fn update_song(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(song_id): Path<String>,
    Json(req): Json<SongRequest>,
) -> Result<Json<Song>, ApiError> {
    let song = songs::get_song(&state.db, &song_id).await?;
    groups::require_role(&state.db, &song.group_guid, &user.guid, Role::Member).await?;

    let song = songs::update_song(&state.db, &song_id, &req.into_draft()).await?;

    state.broadcast_event(RondoEvent::SongUpdated {
        song_id: song.guid.clone(),
        group_id: song.group_guid.clone(),
        timestamp: chrono::Utc::now(),
    });

    Ok(Json(song))
}

/// POST /songs/:song_id/favorite - flip the favorite flag
pub async fn toggle_favorite(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(song_id): Path<String>,
) -> Result<Json<Song>, ApiError> {
    let song = songs::get_song(&state.db, &song_id).await?;
    groups::require_role(&state.db, &song.group_guid, &user.guid, Role::Member).await?;

    let song = songs::toggle_favorite(&state.db, &song_id).await?;

    state.broadcast_event(RondoEvent::SongUpdated {
        song_id: song.guid.clone(),
        group_id: song.group_guid.clone(),
        timestamp: chrono::Utc::now(),
    });

    Ok(Json(song))
}

/// DELETE /songs/:song_id - remove from the library; setlist items
/// referencing the song cascade away
pub async fn delete_song(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(song_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let song = songs::get_song(&state.db, &song_id).await?;
    groups::require_role(&state.db, &song.group_guid, &user.guid, Role::Member).await?;

    songs::delete_song(&state.db, &song_id).await?;

    state.broadcast_event(RondoEvent::SongDeleted {
        song_id: song_id.clone(),
        group_id: song.group_guid.clone(),
        timestamp: chrono::Utc::now(),
    });

    info!("User {} deleted song {}", user.guid, song_id);
    Ok(StatusCode::NO_CONTENT)
}
