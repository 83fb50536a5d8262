//! rondo-api library - the Rondo HTTP service
//!
//! Exposes the song library, round/setlist builder, performance scheduler,
//! and group membership operations over a JSON API. All state lives in the
//! SQLite database; the only in-process shared state is the event channel.

use axum::Router;
use rondo_common::RondoEvent;
use sqlx::SqlitePool;
use tokio::sync::broadcast;

pub mod api;
pub mod db;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Broadcast channel feeding the SSE endpoint
    events: broadcast::Sender<RondoEvent>,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool) -> Self {
        let (events, _) = broadcast::channel(256);
        Self { db, events }
    }

    /// Subscribe to the event broadcast
    pub fn subscribe_events(&self) -> broadcast::Receiver<RondoEvent> {
        self.events.subscribe()
    }

    /// Broadcast an event to all SSE subscribers. Send errors mean nobody
    /// is listening, which is fine.
    pub fn broadcast_event(&self, event: RondoEvent) {
        let _ = self.events.send(event);
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{delete, get, post, put};

    // Protected routes (require a valid session token)
    let protected = Router::new()
        // Groups and membership
        .route("/groups", post(api::groups::create_group))
        .route("/groups", get(api::groups::list_groups))
        .route("/groups/:group_id", get(api::groups::get_group))
        .route("/groups/:group_id", put(api::groups::rename_group))
        .route("/groups/:group_id", delete(api::groups::delete_group))
        .route("/groups/:group_id/members/:user_id", delete(api::groups::remove_member))
        .route("/groups/:group_id/members/:user_id/role", put(api::groups::change_role))
        .route("/groups/:group_id/leave", post(api::groups::leave_group))
        // Invitations
        .route("/groups/:group_id/invitations", post(api::invitations::create_invitation))
        .route("/groups/:group_id/invitations", get(api::invitations::list_invitations))
        .route("/invitations/accept", post(api::invitations::accept_invitation))
        .route("/invitations/decline", post(api::invitations::decline_invitation))
        .route("/invitations/:invitation_id/revoke", post(api::invitations::revoke_invitation))
        // Song library
        .route("/groups/:group_id/songs", post(api::songs::create_song))
        .route("/groups/:group_id/songs", get(api::songs::list_songs))
        .route("/songs/:song_id", get(api::songs::get_song))
        .route("/songs/:song_id", put(api::songs::update_song))
        .route("/songs/:song_id", delete(api::songs::delete_song))
        .route("/songs/:song_id/favorite", post(api::songs::toggle_favorite))
        // Rounds and setlist items
        .route("/groups/:group_id/rounds", post(api::rounds::create_round))
        .route("/groups/:group_id/rounds", get(api::rounds::list_rounds))
        .route("/rounds/:round_id", get(api::rounds::get_round))
        .route("/rounds/:round_id", put(api::rounds::update_round))
        .route("/rounds/:round_id", delete(api::rounds::delete_round))
        .route("/rounds/:round_id/items", post(api::rounds::add_item))
        .route("/rounds/:round_id/items/:song_id", delete(api::rounds::remove_item))
        .route("/rounds/:round_id/reorder", post(api::rounds::reorder_items))
        // Performances and reminders
        .route("/groups/:group_id/performances", post(api::performances::create_performance))
        .route("/groups/:group_id/performances", get(api::performances::list_performances))
        .route("/performances/:performance_id", get(api::performances::get_performance))
        .route("/performances/:performance_id", put(api::performances::update_performance))
        .route("/performances/:performance_id", delete(api::performances::delete_performance))
        .route("/performances/:performance_id/reminders", get(api::performances::list_reminders))
        .route("/reminders/due", get(api::performances::due_reminders))
        // Event stream
        .route("/events", get(api::sse::event_stream))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth::auth_middleware,
        ));

    // Public routes (no authentication)
    let public = Router::new().route("/health", get(api::health::health));

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}
