//! Bearer-token authentication middleware
//!
//! Every protected route passes through here. The token is resolved against
//! the sessions table and the caller's identity is attached to the request
//! extensions for handlers to extract.

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rondo_common::api::auth::validate_token;
use rondo_common::api::types::ErrorResponse;
use tracing::error;

use crate::AppState;

/// Authentication middleware for protected routes
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    let Some(token) = token else {
        return unauthorized("missing_token", "Authorization: Bearer token required");
    };

    match validate_token(&state.db, token).await {
        Ok(Some(user)) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Ok(None) => unauthorized("invalid_token", "Session token is unknown or expired"),
        Err(e) => {
            error!("Failed to validate session token: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("internal", "Failed to validate session")),
            )
                .into_response()
        }
    }
}

fn unauthorized(kind: &str, message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new(kind, message)),
    )
        .into_response()
}
