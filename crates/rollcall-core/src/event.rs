//! Session event definitions
//!
//! Two event kinds fan out to the observers of a session: a presence fact
//! was recorded, and the display ticket rotated. For one session, events are
//! delivered to each observer in publish order; a rotation always follows
//! the presence fact that triggered it.

use serde::{Deserialize, Serialize};

use crate::{ImageArtifact, ParticipantId, Timestamp};

/// Event fanned out to all live observers of a session
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A participant was marked present
    PresenceRecorded {
        participant: ParticipantId,
        display_name: String,
        recorded_at: Timestamp,
    },
    /// The session's display ticket was replaced
    TicketRotated {
        /// Encoded ticket string (for debugging and test harnesses)
        ticket: String,
        expires_at: Timestamp,
        /// Rendered artifact ready for the display surface
        image: ImageArtifact,
    },
}

impl SessionEvent {
    /// Discriminant name, for logs and assertions
    pub fn kind(&self) -> &'static str {
        match self {
            SessionEvent::PresenceRecorded { .. } => "presence_recorded",
            SessionEvent::TicketRotated { .. } => "ticket_rotated",
        }
    }
}
