//! User records
//!
//! Users are provisioned by whatever identity integration fronts the
//! service; this module only stores and resolves the records.

use rondo_common::db::User;
use rondo_common::{Error, Result};
use sqlx::{Pool, Sqlite};
use uuid::Uuid;

/// Insert a user, returning the hydrated row
pub async fn create_user(db: &Pool<Sqlite>, email: &str, display_name: &str) -> Result<User> {
    let guid = Uuid::new_v4().to_string();

    sqlx::query("INSERT INTO users (guid, email, display_name) VALUES (?, ?, ?)")
        .bind(&guid)
        .bind(email)
        .bind(display_name)
        .execute(db)
        .await?;

    get_user(db, &guid).await
}

/// Fetch a user by guid
pub async fn get_user(db: &Pool<Sqlite>, guid: &str) -> Result<User> {
    sqlx::query_as::<_, User>(
        "SELECT guid, email, display_name, created_at FROM users WHERE guid = ?",
    )
    .bind(guid)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| Error::NotFound(format!("user {}", guid)))
}

/// Fetch a user by email, None when unknown
pub async fn find_user_by_email(db: &Pool<Sqlite>, email: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "SELECT guid, email, display_name, created_at FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(db)
    .await?;

    Ok(user)
}
