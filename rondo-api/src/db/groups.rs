//! Groups and membership
//!
//! The group is the tenant boundary: songs, rounds, and performances all
//! hang off a group, and every write is gated by the caller's role in it.

use rondo_common::db::{Group, Role};
use rondo_common::{Error, Result};
use serde::Serialize;
use sqlx::{Pool, Sqlite};
use tracing::debug;
use uuid::Uuid;

/// Membership row joined with user details, for the group detail view
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MemberInfo {
    pub user_guid: String,
    pub email: String,
    pub display_name: String,
    pub role: String,
    pub joined_at: String,
}

/// Create a group; the creator becomes its owner in the same transaction
pub async fn create_group(db: &Pool<Sqlite>, name: &str, owner_guid: &str) -> Result<Group> {
    let guid = Uuid::new_v4().to_string();

    let mut tx = db.begin().await?;

    sqlx::query("INSERT INTO groups (guid, name) VALUES (?, ?)")
        .bind(&guid)
        .bind(name)
        .execute(&mut *tx)
        .await?;

    sqlx::query("INSERT INTO group_members (group_guid, user_guid, role) VALUES (?, ?, 'owner')")
        .bind(&guid)
        .bind(owner_guid)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    debug!("Created group {} owned by {}", guid, owner_guid);
    get_group(db, &guid).await
}

/// Fetch a group by guid
pub async fn get_group(db: &Pool<Sqlite>, guid: &str) -> Result<Group> {
    sqlx::query_as::<_, Group>(
        "SELECT guid, name, created_at, updated_at FROM groups WHERE guid = ?",
    )
    .bind(guid)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| Error::NotFound(format!("group {}", guid)))
}

/// Every group the user belongs to, newest first
pub async fn list_groups_for_user(db: &Pool<Sqlite>, user_guid: &str) -> Result<Vec<Group>> {
    let groups = sqlx::query_as::<_, Group>(
        r#"
        SELECT g.guid, g.name, g.created_at, g.updated_at
        FROM groups g
        INNER JOIN group_members gm ON gm.group_guid = g.guid
        WHERE gm.user_guid = ?
        ORDER BY g.created_at DESC
        "#,
    )
    .bind(user_guid)
    .fetch_all(db)
    .await?;

    Ok(groups)
}

/// Rename a group
pub async fn rename_group(db: &Pool<Sqlite>, guid: &str, name: &str) -> Result<Group> {
    let updated =
        sqlx::query("UPDATE groups SET name = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?")
            .bind(name)
            .bind(guid)
            .execute(db)
            .await?;

    if updated.rows_affected() == 0 {
        return Err(Error::NotFound(format!("group {}", guid)));
    }

    get_group(db, guid).await
}

/// Delete a group; members, invitations, songs, rounds, and performances
/// cascade away with it
pub async fn delete_group(db: &Pool<Sqlite>, guid: &str) -> Result<()> {
    let deleted = sqlx::query("DELETE FROM groups WHERE guid = ?")
        .bind(guid)
        .execute(db)
        .await?;

    if deleted.rows_affected() == 0 {
        return Err(Error::NotFound(format!("group {}", guid)));
    }

    Ok(())
}

/// Members of a group with user details, owners first
pub async fn list_members(db: &Pool<Sqlite>, group_guid: &str) -> Result<Vec<MemberInfo>> {
    let members = sqlx::query_as::<_, MemberInfo>(
        r#"
        SELECT gm.user_guid, u.email, u.display_name, gm.role, gm.joined_at
        FROM group_members gm
        INNER JOIN users u ON u.guid = gm.user_guid
        WHERE gm.group_guid = ?
        ORDER BY CASE gm.role WHEN 'owner' THEN 0 WHEN 'admin' THEN 1 ELSE 2 END,
                 gm.joined_at
        "#,
    )
    .bind(group_guid)
    .fetch_all(db)
    .await?;

    Ok(members)
}

/// The caller's role in a group, None when not a member
pub async fn role_of(db: &Pool<Sqlite>, group_guid: &str, user_guid: &str) -> Result<Option<Role>> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT role FROM group_members WHERE group_guid = ? AND user_guid = ?")
            .bind(group_guid)
            .bind(user_guid)
            .fetch_optional(db)
            .await?;

    match row {
        Some((role,)) => Role::parse(&role)
            .map(Some)
            .ok_or_else(|| Error::Internal(format!("Unknown role '{}' in database", role))),
        None => Ok(None),
    }
}

/// Verify the group exists and the caller holds at least `min` within it.
///
/// A missing group is NotFound; a missing or insufficient membership is
/// Forbidden - callers must be able to tell the two apart.
pub async fn require_role(
    db: &Pool<Sqlite>,
    group_guid: &str,
    user_guid: &str,
    min: Role,
) -> Result<Role> {
    get_group(db, group_guid).await?;

    let role = role_of(db, group_guid, user_guid)
        .await?
        .ok_or_else(|| Error::Forbidden(format!("not a member of group {}", group_guid)))?;

    if role < min {
        return Err(Error::Forbidden(format!(
            "requires {} role on group {}",
            min, group_guid
        )));
    }

    Ok(role)
}

/// Add a membership row. Duplicate membership is a Conflict.
pub async fn add_member(
    db: &Pool<Sqlite>,
    group_guid: &str,
    user_guid: &str,
    role: Role,
) -> Result<()> {
    let existing = role_of(db, group_guid, user_guid).await?;
    if existing.is_some() {
        return Err(Error::Conflict(format!(
            "user {} is already a member of group {}",
            user_guid, group_guid
        )));
    }

    sqlx::query("INSERT INTO group_members (group_guid, user_guid, role) VALUES (?, ?, ?)")
        .bind(group_guid)
        .bind(user_guid)
        .bind(role.as_str())
        .execute(db)
        .await?;

    Ok(())
}

/// Remove a membership row; absent membership is NotFound
pub async fn remove_member(db: &Pool<Sqlite>, group_guid: &str, user_guid: &str) -> Result<()> {
    let deleted = sqlx::query("DELETE FROM group_members WHERE group_guid = ? AND user_guid = ?")
        .bind(group_guid)
        .bind(user_guid)
        .execute(db)
        .await?;

    if deleted.rows_affected() == 0 {
        return Err(Error::NotFound(format!(
            "user {} is not a member of group {}",
            user_guid, group_guid
        )));
    }

    Ok(())
}

/// Change a member's role; absent membership is NotFound
pub async fn change_role(
    db: &Pool<Sqlite>,
    group_guid: &str,
    user_guid: &str,
    role: Role,
) -> Result<()> {
    let updated =
        sqlx::query("UPDATE group_members SET role = ? WHERE group_guid = ? AND user_guid = ?")
            .bind(role.as_str())
            .bind(group_guid)
            .bind(user_guid)
            .execute(db)
            .await?;

    if updated.rows_affected() == 0 {
        return Err(Error::NotFound(format!(
            "user {} is not a member of group {}",
            user_guid, group_guid
        )));
    }

    Ok(())
}

/// Number of owners a group has. Guards against orphaning a group.
pub async fn owner_count(db: &Pool<Sqlite>, group_guid: &str) -> Result<i64> {
    let count: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM group_members WHERE group_guid = ? AND role = 'owner'",
    )
    .bind(group_guid)
    .fetch_one(db)
    .await?;

    Ok(count.0)
}
