//! Group invitations
//!
//! Invitation lifecycle: pending -> accepted | declined | revoked. Accepting
//! creates the membership and consumes the invitation in one transaction.

use rondo_common::db::{Invitation, Role};
use rondo_common::{Error, Result};
use sqlx::{Pool, Sqlite};
use tracing::debug;
use uuid::Uuid;

const INVITATION_COLUMNS: &str =
    "guid, group_guid, email, role, code, invited_by, status, created_at, expires_at";

/// Create a pending invitation with a fresh join code
pub async fn create_invitation(
    db: &Pool<Sqlite>,
    group_guid: &str,
    email: &str,
    role: Role,
    invited_by: &str,
    ttl_hours: i64,
) -> Result<Invitation> {
    if email.trim().is_empty() || !email.contains('@') {
        return Err(Error::InvalidInput(format!("invalid email '{}'", email)));
    }
    if role == Role::Owner {
        return Err(Error::InvalidInput(
            "ownership is transferred, not granted by invitation".to_string(),
        ));
    }

    let pending: Option<(String,)> = sqlx::query_as(
        "SELECT guid FROM invitations
         WHERE group_guid = ? AND email = ? COLLATE NOCASE AND status = 'pending'",
    )
    .bind(group_guid)
    .bind(email)
    .fetch_optional(db)
    .await?;

    if pending.is_some() {
        return Err(Error::Conflict(format!(
            "a pending invitation for {} already exists",
            email
        )));
    }

    let guid = Uuid::new_v4().to_string();
    let code = Uuid::new_v4().simple().to_string();
    let expires_at = (chrono::Utc::now() + chrono::Duration::hours(ttl_hours)).to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO invitations (guid, group_guid, email, role, code, invited_by, expires_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&guid)
    .bind(group_guid)
    .bind(email)
    .bind(role.as_str())
    .bind(&code)
    .bind(invited_by)
    .bind(&expires_at)
    .execute(db)
    .await?;

    debug!("Created invitation {} for {} to group {}", guid, email, group_guid);
    get_invitation(db, &guid).await
}

/// Fetch an invitation by guid
pub async fn get_invitation(db: &Pool<Sqlite>, guid: &str) -> Result<Invitation> {
    sqlx::query_as::<_, Invitation>(&format!(
        "SELECT {} FROM invitations WHERE guid = ?",
        INVITATION_COLUMNS
    ))
    .bind(guid)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| Error::NotFound(format!("invitation {}", guid)))
}

/// A group's invitations, newest first
pub async fn list_invitations(db: &Pool<Sqlite>, group_guid: &str) -> Result<Vec<Invitation>> {
    let invitations = sqlx::query_as::<_, Invitation>(&format!(
        "SELECT {} FROM invitations WHERE group_guid = ? ORDER BY created_at DESC",
        INVITATION_COLUMNS
    ))
    .bind(group_guid)
    .fetch_all(db)
    .await?;

    Ok(invitations)
}

/// Accept an invitation by code: creates the membership and marks the
/// invitation accepted in one transaction. Returns the joined group's guid.
pub async fn accept_invitation(
    db: &Pool<Sqlite>,
    code: &str,
    user_guid: &str,
    user_email: &str,
) -> Result<String> {
    let mut tx = db.begin().await?;

    let invitation: Option<(String, String, String, String, String)> = sqlx::query_as(
        "SELECT guid, group_guid, email, role, status FROM invitations WHERE code = ?",
    )
    .bind(code)
    .fetch_optional(&mut *tx)
    .await?;

    let Some((guid, group_guid, email, role, status)) = invitation else {
        return Err(Error::NotFound("invitation code".to_string()));
    };

    if !email.eq_ignore_ascii_case(user_email) {
        return Err(Error::Forbidden(
            "invitation was issued to a different email address".to_string(),
        ));
    }

    check_pending_and_fresh(&mut tx, &guid, &status).await?;

    let already: Option<(String,)> =
        sqlx::query_as("SELECT role FROM group_members WHERE group_guid = ? AND user_guid = ?")
            .bind(&group_guid)
            .bind(user_guid)
            .fetch_optional(&mut *tx)
            .await?;

    if already.is_some() {
        return Err(Error::Conflict("already a member of this group".to_string()));
    }

    sqlx::query("INSERT INTO group_members (group_guid, user_guid, role) VALUES (?, ?, ?)")
        .bind(&group_guid)
        .bind(user_guid)
        .bind(&role)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE invitations SET status = 'accepted' WHERE guid = ?")
        .bind(&guid)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    debug!("User {} accepted invitation {} into group {}", user_guid, guid, group_guid);
    Ok(group_guid)
}

/// Decline an invitation by code
pub async fn decline_invitation(
    db: &Pool<Sqlite>,
    code: &str,
    user_email: &str,
) -> Result<()> {
    let mut tx = db.begin().await?;

    let invitation: Option<(String, String, String)> =
        sqlx::query_as("SELECT guid, email, status FROM invitations WHERE code = ?")
            .bind(code)
            .fetch_optional(&mut *tx)
            .await?;

    let Some((guid, email, status)) = invitation else {
        return Err(Error::NotFound("invitation code".to_string()));
    };

    if !email.eq_ignore_ascii_case(user_email) {
        return Err(Error::Forbidden(
            "invitation was issued to a different email address".to_string(),
        ));
    }

    check_pending_and_fresh(&mut tx, &guid, &status).await?;

    sqlx::query("UPDATE invitations SET status = 'declined' WHERE guid = ?")
        .bind(&guid)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

/// Revoke a pending invitation (admin action)
pub async fn revoke_invitation(db: &Pool<Sqlite>, guid: &str) -> Result<Invitation> {
    let invitation = get_invitation(db, guid).await?;

    if invitation.status != "pending" {
        return Err(Error::Conflict(format!(
            "invitation is already {}",
            invitation.status
        )));
    }

    sqlx::query("UPDATE invitations SET status = 'revoked' WHERE guid = ?")
        .bind(guid)
        .execute(db)
        .await?;

    get_invitation(db, guid).await
}

/// Reject answered or expired invitations
async fn check_pending_and_fresh(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    guid: &str,
    status: &str,
) -> Result<()> {
    if status != "pending" {
        return Err(Error::Conflict(format!("invitation is already {}", status)));
    }

    let (expires_at,): (String,) =
        sqlx::query_as("SELECT expires_at FROM invitations WHERE guid = ?")
            .bind(guid)
            .fetch_one(&mut **tx)
            .await?;

    let expires = chrono::DateTime::parse_from_rfc3339(&expires_at)
        .map_err(|e| Error::Internal(format!("Malformed invitation expiry: {}", e)))?;

    if expires < chrono::Utc::now() {
        return Err(Error::Conflict("invitation has expired".to_string()));
    }

    Ok(())
}
