//! Invitation endpoints

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use rondo_common::api::auth::AuthenticatedUser;
use rondo_common::db::{Invitation, Role};
use rondo_common::{Error, RondoEvent};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::ApiError;
use crate::db::{groups, invitations, settings};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct InvitationRequest {
    pub email: String,
    /// "member" (default) or "admin"
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CodeRequest {
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct AcceptResponse {
    pub group_id: String,
}

/// POST /groups/:group_id/invitations - invite by email; admins only
pub async fn create_invitation(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(group_id): Path<String>,
    Json(req): Json<InvitationRequest>,
) -> Result<(StatusCode, Json<Invitation>), ApiError> {
    groups::require_role(&state.db, &group_id, &user.guid, Role::Admin).await?;

    let role = match req.role.as_deref() {
        None => Role::Member,
        Some(raw) => Role::parse(raw)
            .ok_or_else(|| Error::InvalidInput(format!("unknown role '{}'", raw)))?,
    };

    let ttl_hours = settings::invitation_ttl_hours(&state.db).await?;
    let invitation = invitations::create_invitation(
        &state.db,
        &group_id,
        req.email.trim(),
        role,
        &user.guid,
        ttl_hours,
    )
    .await?;

    state.broadcast_event(RondoEvent::InvitationCreated {
        group_id: group_id.clone(),
        invitation_id: invitation.guid.clone(),
        timestamp: chrono::Utc::now(),
    });

    info!("User {} invited {} to group {}", user.guid, invitation.email, group_id);
    Ok((StatusCode::CREATED, Json(invitation)))
}

/// GET /groups/:group_id/invitations - admins only
pub async fn list_invitations(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<Invitation>>, ApiError> {
    groups::require_role(&state.db, &group_id, &user.guid, Role::Admin).await?;

    let list = invitations::list_invitations(&state.db, &group_id).await?;
    Ok(Json(list))
}

/// POST /invitations/accept - join a group by invitation code
pub async fn accept_invitation(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(req): Json<CodeRequest>,
) -> Result<Json<AcceptResponse>, ApiError> {
    let group_id =
        invitations::accept_invitation(&state.db, req.code.trim(), &user.guid, &user.email)
            .await?;

    state.broadcast_event(RondoEvent::MemberJoined {
        group_id: group_id.clone(),
        user_id: user.guid.clone(),
        timestamp: chrono::Utc::now(),
    });

    info!("User {} joined group {} by invitation", user.guid, group_id);
    Ok(Json(AcceptResponse { group_id }))
}

/// POST /invitations/decline - decline an invitation code
pub async fn decline_invitation(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(req): Json<CodeRequest>,
) -> Result<StatusCode, ApiError> {
    invitations::decline_invitation(&state.db, req.code.trim(), &user.email).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /invitations/:invitation_id/revoke - withdraw a pending invitation;
/// admins of the owning group only
pub async fn revoke_invitation(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(invitation_id): Path<String>,
) -> Result<Json<Invitation>, ApiError> {
    let invitation = invitations::get_invitation(&state.db, &invitation_id).await?;
    groups::require_role(&state.db, &invitation.group_guid, &user.guid, Role::Admin).await?;

    let invitation = invitations::revoke_invitation(&state.db, &invitation_id).await?;

    info!("User {} revoked invitation {}", user.guid, invitation_id);
    Ok(Json(invitation))
}
