//! Session-token authentication helpers
//!
//! Callers authenticate with an opaque bearer token. Tokens are generated
//! here, stored SHA-256-hashed in the `sessions` table, and resolved back to
//! a user on every request. Identity-provider integration lives outside this
//! repository; whatever fronts the service calls [`issue_session`] after it
//! has established who the caller is. Tests do the same.
//!
//! This module contains only pure functions and database operations. No HTTP
//! framework dependencies - the axum middleware lives in the service crate.

use crate::{Error, Result};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;

/// Resolved caller identity attached to authenticated requests
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub guid: String,
    pub email: String,
    pub display_name: String,
}

/// Generate a new opaque session token (64 hex chars)
pub fn generate_token() -> String {
    use rand::Rng;

    let bytes: [u8; 32] = rand::thread_rng().gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// SHA-256 hex digest of a token. Only the hash is ever persisted.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Session TTL from the settings table (hours), defaulting to 30 days
pub async fn session_ttl_hours(db: &SqlitePool) -> Result<i64> {
    let value: Option<(String,)> =
        sqlx::query_as("SELECT value FROM settings WHERE key = 'session_ttl_hours'")
            .fetch_optional(db)
            .await?;

    match value {
        Some((v,)) => v
            .parse::<i64>()
            .map_err(|e| Error::Config(format!("Invalid session_ttl_hours: {}", e))),
        None => Ok(720),
    }
}

/// Create a session for an existing user and return the raw token.
///
/// The raw token is returned exactly once; only its hash is stored.
///
/// # Examples
///
/// ```ignore
/// let token = issue_session(&db, &user_guid, None).await?;
/// // hand `token` to the client; it goes in the Authorization header
/// ```
pub async fn issue_session(
    db: &SqlitePool,
    user_guid: &str,
    ttl_hours: Option<i64>,
) -> Result<String> {
    let exists: Option<(String,)> = sqlx::query_as("SELECT guid FROM users WHERE guid = ?")
        .bind(user_guid)
        .fetch_optional(db)
        .await?;

    if exists.is_none() {
        return Err(Error::NotFound(format!("user {}", user_guid)));
    }

    let ttl = match ttl_hours {
        Some(hours) => hours,
        None => session_ttl_hours(db).await?,
    };

    let token = generate_token();
    let expires_at = (chrono::Utc::now() + chrono::Duration::hours(ttl)).to_rfc3339();

    sqlx::query("INSERT INTO sessions (token_hash, user_guid, expires_at) VALUES (?, ?, ?)")
        .bind(hash_token(&token))
        .bind(user_guid)
        .bind(&expires_at)
        .execute(db)
        .await?;

    Ok(token)
}

/// Resolve a raw bearer token to its user. Returns None for unknown or
/// expired tokens; expired rows are deleted on sight.
pub async fn validate_token(db: &SqlitePool, token: &str) -> Result<Option<AuthenticatedUser>> {
    let token_hash = hash_token(token);

    let row: Option<(String, String, String, String)> = sqlx::query_as(
        r#"
        SELECT u.guid, u.email, u.display_name, s.expires_at
        FROM sessions s
        INNER JOIN users u ON u.guid = s.user_guid
        WHERE s.token_hash = ?
        "#,
    )
    .bind(&token_hash)
    .fetch_optional(db)
    .await?;

    let Some((guid, email, display_name, expires_at)) = row else {
        return Ok(None);
    };

    let expires = chrono::DateTime::parse_from_rfc3339(&expires_at)
        .map_err(|e| Error::Internal(format!("Malformed session expiry: {}", e)))?;

    if expires < chrono::Utc::now() {
        sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(&token_hash)
            .execute(db)
            .await?;
        return Ok(None);
    }

    Ok(Some(AuthenticatedUser {
        guid,
        email,
        display_name,
    }))
}

/// Delete a session by raw token (logout). No-op for unknown tokens.
pub async fn revoke_session(db: &SqlitePool, token: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
        .bind(hash_token(token))
        .execute(db)
        .await?;

    Ok(())
}

/// Remove all expired sessions. Called opportunistically at startup.
pub async fn purge_expired_sessions(db: &SqlitePool) -> Result<u64> {
    let now = chrono::Utc::now().to_rfc3339();
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
        .bind(&now)
        .execute(db)
        .await?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_64_hex_chars_and_unique() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn hash_is_stable_and_differs_from_token() {
        let token = generate_token();
        assert_eq!(hash_token(&token), hash_token(&token));
        assert_ne!(hash_token(&token), token);
        assert_eq!(hash_token(&token).len(), 64);
    }
}
