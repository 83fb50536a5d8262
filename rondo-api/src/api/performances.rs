//! Performance and reminder endpoints

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use rondo_common::api::auth::AuthenticatedUser;
use rondo_common::db::{Performance, PerformanceReminder, Role};
use rondo_common::RondoEvent;
use serde::Deserialize;
use tracing::info;

use super::ApiError;
use crate::db::performances::{self, PerformanceDraft};
use crate::db::reminders::{self, DueReminder};
use crate::db::{groups, settings};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PerformanceRequest {
    pub round_id: Option<String>,
    pub venue: String,
    /// RFC 3339 timestamp
    pub starts_at: String,
    pub notes: Option<String>,
}

impl PerformanceRequest {
    fn into_draft(self) -> PerformanceDraft {
        PerformanceDraft {
            round_guid: self.round_id,
            venue: self.venue.trim().to_string(),
            starts_at: self.starts_at,
            notes: self.notes,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DueQuery {
    /// RFC 3339 cutoff; defaults to now
    pub before: Option<String>,
}

/// POST /groups/:group_id/performances - schedule a performance; its
/// reminders are computed in the same transaction
pub async fn create_performance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(group_id): Path<String>,
    Json(req): Json<PerformanceRequest>,
) -> Result<(StatusCode, Json<Performance>), ApiError> {
    groups::require_role(&state.db, &group_id, &user.guid, Role::Member).await?;

    let leads = settings::reminder_lead_minutes(&state.db).await?;
    let performance =
        performances::create_performance(&state.db, &group_id, &req.into_draft(), &leads).await?;

    state.broadcast_event(RondoEvent::PerformanceScheduled {
        performance_id: performance.guid.clone(),
        group_id: group_id.clone(),
        starts_at: performance.starts_at.clone(),
        timestamp: chrono::Utc::now(),
    });

    info!(
        "User {} scheduled performance {} in group {}",
        user.guid, performance.guid, group_id
    );
    Ok((StatusCode::CREATED, Json(performance)))
}

/// GET /groups/:group_id/performances - calendar order
pub async fn list_performances(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<Performance>>, ApiError> {
    groups::require_role(&state.db, &group_id, &user.guid, Role::Member).await?;

    let list = performances::list_performances(&state.db, &group_id).await?;
    Ok(Json(list))
}

/// GET /performances/:performance_id
pub async fn get_performance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(performance_id): Path<String>,
) -> Result<Json<Performance>, ApiError> {
    let performance = performances::get_performance(&state.db, &performance_id).await?;
    groups::require_role(&state.db, &performance.group_guid, &user.guid, Role::Member).await?;

    Ok(Json(performance))
}

/// PUT /performances/:performance_id - update; reminders recomputed from
/// the new start time
pub async fn update_performance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(performance_id): Path<String>,
    Json(req): Json<PerformanceRequest>,
) -> Result<Json<Performance>, ApiError> {
    let performance = performances::get_performance(&state.db, &performance_id).await?;
    groups::require_role(&state.db, &performance.group_guid, &user.guid, Role::Member).await?;

    let leads = settings::reminder_lead_minutes(&state.db).await?;
    let performance =
        performances::update_performance(&state.db, &performance_id, &req.into_draft(), &leads)
            .await?;

    state.broadcast_event(RondoEvent::PerformanceUpdated {
        performance_id: performance.guid.clone(),
        group_id: performance.group_guid.clone(),
        timestamp: chrono::Utc::now(),
    });

    Ok(Json(performance))
}

/// DELETE /performances/:performance_id - cancel
pub async fn delete_performance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(performance_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let performance = performances::get_performance(&state.db, &performance_id).await?;
    groups::require_role(&state.db, &performance.group_guid, &user.guid, Role::Member).await?;

    performances::delete_performance(&state.db, &performance_id).await?;

    state.broadcast_event(RondoEvent::PerformanceCancelled {
        performance_id: performance_id.clone(),
        group_id: performance.group_guid.clone(),
        timestamp: chrono::Utc::now(),
    });

    info!("User {} cancelled performance {}", user.guid, performance_id);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /performances/:performance_id/reminders
pub async fn list_reminders(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(performance_id): Path<String>,
) -> Result<Json<Vec<PerformanceReminder>>, ApiError> {
    let performance = performances::get_performance(&state.db, &performance_id).await?;
    groups::require_role(&state.db, &performance.group_guid, &user.guid, Role::Member).await?;

    let list = reminders::list_for_performance(&state.db, &performance_id).await?;
    Ok(Json(list))
}

/// GET /reminders/due?before= - pending reminders across the caller's
/// groups, for clients and the external delivery collaborator
pub async fn due_reminders(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<DueQuery>,
) -> Result<Json<Vec<DueReminder>>, ApiError> {
    let before = query
        .before
        .unwrap_or_else(|| chrono::Utc::now().to_rfc3339());

    let list = reminders::due_before(&state.db, &user.guid, &before).await?;
    Ok(Json(list))
}
