//! # Rondo Common Library
//!
//! Shared code for the Rondo band management service including:
//! - Database models and schema initialization
//! - Event types (RondoEvent enum)
//! - API request/response types
//! - Session token helpers
//! - Configuration loading

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod events;

pub use error::{Error, Result};
pub use events::RondoEvent;
