//! Round and setlist item endpoints
//!
//! Item mutations route through the setlist reconciler, which keeps
//! positions dense and unique. Authorization is checked here, before any
//! reconciliation runs.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use rondo_common::api::auth::AuthenticatedUser;
use rondo_common::api::types::SuccessResponse;
use rondo_common::db::{Role, Round, RoundItem};
use rondo_common::RondoEvent;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::ApiError;
use crate::db::rounds::{self, RoundItemDetail};
use crate::db::{groups, setlist};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RoundRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RoundDetail {
    #[serde(flatten)]
    pub round: Round,
    pub items: Vec<RoundItemDetail>,
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub song_id: String,
    pub position: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub ordered_song_ids: Vec<String>,
}

/// POST /groups/:group_id/rounds
pub async fn create_round(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(group_id): Path<String>,
    Json(req): Json<RoundRequest>,
) -> Result<(StatusCode, Json<Round>), ApiError> {
    groups::require_role(&state.db, &group_id, &user.guid, Role::Member).await?;

    let round =
        rounds::create_round(&state.db, &group_id, req.name.trim(), req.description.as_deref())
            .await?;

    state.broadcast_event(RondoEvent::RoundCreated {
        round_id: round.guid.clone(),
        group_id: group_id.clone(),
        timestamp: chrono::Utc::now(),
    });

    info!("User {} created round {} in group {}", user.guid, round.guid, group_id);
    Ok((StatusCode::CREATED, Json(round)))
}

/// GET /groups/:group_id/rounds
pub async fn list_rounds(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<Round>>, ApiError> {
    groups::require_role(&state.db, &group_id, &user.guid, Role::Member).await?;

    let list = rounds::list_rounds(&state.db, &group_id).await?;
    Ok(Json(list))
}

/// GET /rounds/:round_id - round with its items in position order
pub async fn get_round(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(round_id): Path<String>,
) -> Result<Json<RoundDetail>, ApiError> {
    let round = rounds::get_round(&state.db, &round_id).await?;
    groups::require_role(&state.db, &round.group_guid, &user.guid, Role::Member).await?;

    let items = rounds::list_item_details(&state.db, &round_id).await?;

    Ok(Json(RoundDetail { round, items }))
}

/// PUT /rounds/:round_id
pub async fn update_round(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(round_id): Path<String>,
    Json(req): Json<RoundRequest>,
) -> Result<Json<Round>, ApiError> {
    let round = rounds::get_round(&state.db, &round_id).await?;
    groups::require_role(&state.db, &round.group_guid, &user.guid, Role::Member).await?;

    let round =
        rounds::update_round(&state.db, &round_id, req.name.trim(), req.description.as_deref())
            .await?;

    state.broadcast_event(RondoEvent::RoundUpdated {
        round_id: round.guid.clone(),
        group_id: round.group_guid.clone(),
        timestamp: chrono::Utc::now(),
    });

    Ok(Json(round))
}

/// DELETE /rounds/:round_id
pub async fn delete_round(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(round_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let round = rounds::get_round(&state.db, &round_id).await?;
    groups::require_role(&state.db, &round.group_guid, &user.guid, Role::Member).await?;

    rounds::delete_round(&state.db, &round_id).await?;

    state.broadcast_event(RondoEvent::RoundDeleted {
        round_id: round_id.clone(),
        group_id: round.group_guid.clone(),
        timestamp: chrono::Utc::now(),
    });

    info!("User {} deleted round {}", user.guid, round_id);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /rounds/:round_id/items - add a song to the setlist
pub async fn add_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(round_id): Path<String>,
    Json(req): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<RoundItem>), ApiError> {
    let round = rounds::get_round(&state.db, &round_id).await?;
    groups::require_role(&state.db, &round.group_guid, &user.guid, Role::Member).await?;

    let item = setlist::add_song(
        &state.db,
        &round_id,
        &req.song_id,
        req.position,
        req.notes.as_deref(),
    )
    .await?;

    state.broadcast_event(RondoEvent::SetlistChanged {
        round_id: round_id.clone(),
        timestamp: chrono::Utc::now(),
    });

    Ok((StatusCode::CREATED, Json(item)))
}

/// DELETE /rounds/:round_id/items/:song_id - remove a song from the
/// setlist. Succeeds whether or not the song was present.
pub async fn remove_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path((round_id, song_id)): Path<(String, String)>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let round = rounds::get_round(&state.db, &round_id).await?;
    groups::require_role(&state.db, &round.group_guid, &user.guid, Role::Member).await?;

    let removed = setlist::remove_song(&state.db, &round_id, &song_id).await?;

    if removed {
        state.broadcast_event(RondoEvent::SetlistChanged {
            round_id: round_id.clone(),
            timestamp: chrono::Utc::now(),
        });
    }

    Ok(Json(SuccessResponse { success: true }))
}

/// POST /rounds/:round_id/reorder - replace the setlist's membership and
/// order in one transactional pass
pub async fn reorder_items(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(round_id): Path<String>,
    Json(req): Json<ReorderRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let round = rounds::get_round(&state.db, &round_id).await?;
    groups::require_role(&state.db, &round.group_guid, &user.guid, Role::Member).await?;

    let outcome = setlist::reconcile(&state.db, &round_id, &req.ordered_song_ids).await?;

    if outcome != setlist::ReconcileOutcome::default() {
        state.broadcast_event(RondoEvent::SetlistChanged {
            round_id: round_id.clone(),
            timestamp: chrono::Utc::now(),
        });
    }

    info!(
        "User {} reordered round {}: {} deleted, {} repositioned, {} created",
        user.guid, round_id, outcome.deleted, outcome.repositioned, outcome.created
    );
    Ok(Json(SuccessResponse { success: true }))
}
