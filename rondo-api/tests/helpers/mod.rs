//! Shared test fixtures for rondo-api integration tests
//!
//! Builds routers over in-memory databases and seeds users, sessions, and
//! groups so individual tests stay focused on the behavior under test.

// Not every test binary uses every helper
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request};
use axum::Router;
use rondo_api::{build_router, AppState};
use rondo_common::api::auth::issue_session;
use rondo_common::db::{init_memory_database, User};
use serde_json::Value;
use sqlx::SqlitePool;

/// Fresh in-memory database with the full schema applied
pub async fn setup_db() -> SqlitePool {
    init_memory_database()
        .await
        .expect("Should create in-memory database")
}

/// Router over the given database
pub fn setup_app(db: SqlitePool) -> Router {
    build_router(AppState::new(db))
}

/// Create a user and an active session, returning both
pub async fn seed_user(db: &SqlitePool, email: &str, name: &str) -> (User, String) {
    let user = rondo_api::db::users::create_user(db, email, name)
        .await
        .expect("Should create user");
    let token = issue_session(db, &user.guid, Some(24))
        .await
        .expect("Should issue session");
    (user, token)
}

/// Create a group owned by the given user, returning its guid
pub async fn seed_group(db: &SqlitePool, owner_guid: &str, name: &str) -> String {
    rondo_api::db::groups::create_group(db, name, owner_guid)
        .await
        .expect("Should create group")
        .guid
}

/// Create a song in a group, returning its guid
pub async fn seed_song(db: &SqlitePool, group_guid: &str, title: &str) -> String {
    let draft = rondo_api::db::songs::SongDraft {
        title: title.to_string(),
        ..Default::default()
    };
    rondo_api::db::songs::create_song(db, group_guid, &draft)
        .await
        .expect("Should create song")
        .guid
}

/// Create a round in a group, returning its guid
pub async fn seed_round(db: &SqlitePool, group_guid: &str, name: &str) -> String {
    rondo_api::db::rounds::create_round(db, group_guid, name, None)
        .await
        .expect("Should create round")
        .guid
}

/// Build a request, optionally authenticated and with a JSON body
pub fn test_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Extract JSON body from a response
pub async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

/// Read back a round's (song_guid, position) pairs ordered by position
pub async fn read_setlist(db: &SqlitePool, round_guid: &str) -> Vec<(String, i64)> {
    rondo_api::db::setlist::list_items(db, round_guid)
        .await
        .expect("Should list items")
        .into_iter()
        .map(|item| (item.song_guid, item.position))
        .collect()
}
