//! Database access layer
//!
//! Provides database queries for groups, invitations, the song library,
//! rounds and their setlist items, performances, reminders, and settings.

pub mod groups;
pub mod invitations;
pub mod performances;
pub mod reminders;
pub mod rounds;
pub mod setlist;
pub mod settings;
pub mod songs;
pub mod users;
