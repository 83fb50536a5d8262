//! HTTP API handlers for rondo-api

pub mod auth;
pub mod groups;
pub mod health;
pub mod invitations;
pub mod performances;
pub mod rounds;
pub mod songs;
pub mod sse;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rondo_common::api::types::ErrorResponse;
use rondo_common::Error;
use tracing::error;

/// Wrapper turning the shared error taxonomy into HTTP responses.
/// Handlers return `Result<_, ApiError>` and use `?` on db-layer calls.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self.0 {
            Error::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Error::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            Error::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            Error::InvalidInput(_) => (StatusCode::BAD_REQUEST, "invalid_input"),
            Error::Database(_) | Error::Io(_) | Error::Config(_) | Error::Internal(_) => {
                error!("Internal error serving request: {}", self.0);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
        };

        let body = Json(ErrorResponse::new(kind, self.0.to_string()));
        (status, body).into_response()
    }
}
