//! Group and membership endpoints

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use rondo_common::api::auth::AuthenticatedUser;
use rondo_common::db::{Group, Role};
use rondo_common::{Error, RondoEvent};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::ApiError;
use crate::db::groups;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct GroupRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct GroupDetail {
    #[serde(flatten)]
    pub group: Group,
    pub members: Vec<groups::MemberInfo>,
}

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub role: String,
}

/// POST /groups - create a group; the caller becomes its owner
pub async fn create_group(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(req): Json<GroupRequest>,
) -> Result<(StatusCode, Json<Group>), ApiError> {
    if req.name.trim().is_empty() {
        return Err(Error::InvalidInput("group name must not be empty".to_string()).into());
    }

    let group = groups::create_group(&state.db, req.name.trim(), &user.guid).await?;

    info!("User {} created group {}", user.guid, group.guid);
    Ok((StatusCode::CREATED, Json(group)))
}

/// GET /groups - the caller's groups
pub async fn list_groups(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<Group>>, ApiError> {
    let list = groups::list_groups_for_user(&state.db, &user.guid).await?;
    Ok(Json(list))
}

/// GET /groups/:group_id - group with members; members only
pub async fn get_group(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(group_id): Path<String>,
) -> Result<Json<GroupDetail>, ApiError> {
    groups::require_role(&state.db, &group_id, &user.guid, Role::Member).await?;

    let group = groups::get_group(&state.db, &group_id).await?;
    let members = groups::list_members(&state.db, &group_id).await?;

    Ok(Json(GroupDetail { group, members }))
}

/// PUT /groups/:group_id - rename; admins only
pub async fn rename_group(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(group_id): Path<String>,
    Json(req): Json<GroupRequest>,
) -> Result<Json<Group>, ApiError> {
    if req.name.trim().is_empty() {
        return Err(Error::InvalidInput("group name must not be empty".to_string()).into());
    }

    groups::require_role(&state.db, &group_id, &user.guid, Role::Admin).await?;

    let group = groups::rename_group(&state.db, &group_id, req.name.trim()).await?;
    Ok(Json(group))
}

/// DELETE /groups/:group_id - owners only; everything in the group cascades
pub async fn delete_group(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(group_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    groups::require_role(&state.db, &group_id, &user.guid, Role::Owner).await?;

    groups::delete_group(&state.db, &group_id).await?;

    info!("User {} deleted group {}", user.guid, group_id);
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /groups/:group_id/members/:user_id - remove a member.
///
/// Requires admin; the target must rank strictly below the caller, so
/// admins cannot remove each other and owners are never removed here
/// (ownership is transferred first).
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path((group_id, user_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let caller_role = groups::require_role(&state.db, &group_id, &user.guid, Role::Admin).await?;

    if user_id == user.guid {
        return Err(Error::InvalidInput(
            "use the leave endpoint to remove yourself".to_string(),
        )
        .into());
    }

    let target_role = groups::role_of(&state.db, &group_id, &user_id)
        .await?
        .ok_or_else(|| {
            Error::NotFound(format!("user {} is not a member of group {}", user_id, group_id))
        })?;

    if target_role >= caller_role {
        return Err(Error::Forbidden(
            "cannot remove a member of equal or higher role".to_string(),
        )
        .into());
    }

    groups::remove_member(&state.db, &group_id, &user_id).await?;

    state.broadcast_event(RondoEvent::MemberRemoved {
        group_id: group_id.clone(),
        user_id: user_id.clone(),
        timestamp: chrono::Utc::now(),
    });

    info!("User {} removed {} from group {}", user.guid, user_id, group_id);
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /groups/:group_id/members/:user_id/role - change a member's role.
///
/// Owners only. Promoting another member to owner is how ownership is
/// transferred; an owner may then step down, as long as the group keeps at
/// least one owner.
pub async fn change_role(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path((group_id, user_id)): Path<(String, String)>,
    Json(req): Json<RoleRequest>,
) -> Result<StatusCode, ApiError> {
    groups::require_role(&state.db, &group_id, &user.guid, Role::Owner).await?;

    let new_role = Role::parse(&req.role)
        .ok_or_else(|| Error::InvalidInput(format!("unknown role '{}'", req.role)))?;

    let target_role = groups::role_of(&state.db, &group_id, &user_id)
        .await?
        .ok_or_else(|| {
            Error::NotFound(format!("user {} is not a member of group {}", user_id, group_id))
        })?;

    // Demoting an owner (including yourself) must leave another owner behind
    if target_role == Role::Owner
        && new_role < Role::Owner
        && groups::owner_count(&state.db, &group_id).await? <= 1
    {
        return Err(Error::Conflict(
            "group must keep at least one owner; transfer ownership first".to_string(),
        )
        .into());
    }

    groups::change_role(&state.db, &group_id, &user_id, new_role).await?;

    info!(
        "User {} changed role of {} in group {} to {}",
        user.guid, user_id, group_id, new_role
    );
    Ok(StatusCode::NO_CONTENT)
}

/// POST /groups/:group_id/leave - leave a group
pub async fn leave_group(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(group_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let role = groups::require_role(&state.db, &group_id, &user.guid, Role::Member).await?;

    if role == Role::Owner && groups::owner_count(&state.db, &group_id).await? <= 1 {
        return Err(Error::Conflict(
            "sole owner cannot leave; transfer ownership or delete the group".to_string(),
        )
        .into());
    }

    groups::remove_member(&state.db, &group_id, &user.guid).await?;

    state.broadcast_event(RondoEvent::MemberRemoved {
        group_id: group_id.clone(),
        user_id: user.guid.clone(),
        timestamp: chrono::Utc::now(),
    });

    info!("User {} left group {}", user.guid, group_id);
    Ok(StatusCode::NO_CONTENT)
}
