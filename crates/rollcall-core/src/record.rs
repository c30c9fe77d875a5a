//! Presence records and display artifacts

use serde::{Deserialize, Serialize};

use crate::{ParticipantId, SessionId, Timestamp};

/// Immutable fact: a participant was present at a session at a given time.
///
/// Created exactly once per `(session, participant)` pair by the presence
/// ledger; never mutated or deleted afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceRecord {
    pub session: SessionId,
    pub participant: ParticipantId,
    pub recorded_at: Timestamp,
}

impl PresenceRecord {
    pub fn new(session: SessionId, participant: ParticipantId, recorded_at: Timestamp) -> Self {
        PresenceRecord {
            session,
            participant,
            recorded_at,
        }
    }
}

/// Displayable rendering of a ticket, handed to the host's display surface
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageArtifact {
    /// MIME type of `data`
    pub media_type: String,
    /// Image document body (e.g. an SVG document)
    pub data: String,
}

impl ImageArtifact {
    pub fn svg(data: String) -> Self {
        ImageArtifact {
            media_type: "image/svg+xml".to_string(),
            data,
        }
    }
}
