//! Participant directory boundary
//!
//! Display names live with the external identity collaborator; the engine
//! only needs a name to put in `PresenceRecorded` events. Hosts plug in
//! their directory; without one, the hex participant id is used.

use rollcall_core::ParticipantId;

/// External identity collaborator supplying display names
pub trait ParticipantDirectory: Send + Sync {
    /// Display name for a participant, if the directory knows one
    fn display_name(&self, participant: ParticipantId) -> Option<String>;
}

/// Directory that knows nobody; callers fall back to the hex id
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDirectory;

impl ParticipantDirectory for NullDirectory {
    fn display_name(&self, _participant: ParticipantId) -> Option<String> {
        None
    }
}

/// Derive a display name from an institutional email of the form
/// `first.last@host`, yielding `"Last First"`. Anything else comes back
/// unchanged. Useful for directory implementations backed by an account
/// store that has emails but no profile names.
pub fn display_name_from_email(email: &str) -> String {
    let Some(local) = email.split('@').next() else {
        return email.to_string();
    };
    let parts: Vec<&str> = local.split('.').collect();
    if parts.len() == 2 {
        format!("{} {}", capitalize(parts[1]), capitalize(parts[0]))
    } else {
        email.to_string()
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
