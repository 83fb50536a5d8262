//! Event types for the Rondo event system
//!
//! Mutation handlers broadcast these over the service's event channel; the
//! SSE endpoint relays them to connected clients. Payloads carry ids only,
//! clients re-fetch whatever detail they render.

use serde::{Deserialize, Serialize};

/// Rondo event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RondoEvent {
    /// Song created in a group's library
    SongCreated {
        song_id: String,
        group_id: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Song attributes changed (including the favorite flag)
    SongUpdated {
        song_id: String,
        group_id: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Song removed from the library
    SongDeleted {
        song_id: String,
        group_id: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Round created
    RoundCreated {
        round_id: String,
        group_id: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Round name/description changed
    RoundUpdated {
        round_id: String,
        group_id: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Round deleted (items cascade away with it)
    RoundDeleted {
        round_id: String,
        group_id: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A round's item set or ordering changed (notification only - no data)
    SetlistChanged {
        round_id: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Performance scheduled
    PerformanceScheduled {
        performance_id: String,
        group_id: String,
        starts_at: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Performance details changed
    PerformanceUpdated {
        performance_id: String,
        group_id: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Performance cancelled
    PerformanceCancelled {
        performance_id: String,
        group_id: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A user joined a group (invitation accepted)
    MemberJoined {
        group_id: String,
        user_id: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A user left or was removed from a group
    MemberRemoved {
        group_id: String,
        user_id: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Invitation created for a group
    InvitationCreated {
        group_id: String,
        invitation_id: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl RondoEvent {
    /// Event type string used as the SSE event name
    pub fn event_type(&self) -> &'static str {
        match self {
            RondoEvent::SongCreated { .. } => "SongCreated",
            RondoEvent::SongUpdated { .. } => "SongUpdated",
            RondoEvent::SongDeleted { .. } => "SongDeleted",
            RondoEvent::RoundCreated { .. } => "RoundCreated",
            RondoEvent::RoundUpdated { .. } => "RoundUpdated",
            RondoEvent::RoundDeleted { .. } => "RoundDeleted",
            RondoEvent::SetlistChanged { .. } => "SetlistChanged",
            RondoEvent::PerformanceScheduled { .. } => "PerformanceScheduled",
            RondoEvent::PerformanceUpdated { .. } => "PerformanceUpdated",
            RondoEvent::PerformanceCancelled { .. } => "PerformanceCancelled",
            RondoEvent::MemberJoined { .. } => "MemberJoined",
            RondoEvent::MemberRemoved { .. } => "MemberRemoved",
            RondoEvent::InvitationCreated { .. } => "InvitationCreated",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let event = RondoEvent::SetlistChanged {
            round_id: "r-1".to_string(),
            timestamp: chrono::Utc::now(),
        };

        let json = serde_json::to_string(&event).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "SetlistChanged");
        assert_eq!(value["round_id"], "r-1");
    }

    #[test]
    fn event_type_matches_serde_tag() {
        let event = RondoEvent::MemberJoined {
            group_id: "g".to_string(),
            user_id: "u".to_string(),
            timestamp: chrono::Utc::now(),
        };

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], event.event_type());
    }
}
