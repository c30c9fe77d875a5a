//! Error types for the roll-call engine

use thiserror::Error;

use crate::SessionId;

/// Why a presented ticket was rejected.
///
/// These are expected, frequent outcomes (a scan landing just after a
/// concurrent rotation is normal traffic), never internal failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    /// Signature did not verify, or the string could not be decoded at all
    BadSignature,
    /// `now >= expires_at`
    Expired,
    /// Ticket is bound to a different session
    WrongSession,
    /// Valid signature and time box, but superseded by a rotation
    NotCurrent,
}

impl RejectReason {
    /// Human-readable rejection, suitable for the scanning participant
    pub fn message(self) -> &'static str {
        match self {
            RejectReason::BadSignature => "this code is not valid",
            RejectReason::Expired => "this code has expired",
            RejectReason::WrongSession => "this code belongs to a different session",
            RejectReason::NotCurrent => "this code has already been refreshed, scan the current one",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Core roll-call errors
#[derive(Error, Debug)]
pub enum RollcallError {
    // Codec errors
    #[error("Invalid ticket encoding")]
    InvalidEncoding,

    #[error("Ticket length mismatch: expected {expected}, got {actual}")]
    TruncatedPayload { expected: usize, actual: usize },

    #[error("Ticket signature mismatch")]
    SignatureMismatch,

    // Validation rejections
    #[error("Ticket rejected: {0}")]
    TicketRejected(RejectReason),

    // Session registry errors
    #[error("Session not found: {0:?}")]
    SessionNotFound(SessionId),

    #[error("Session already open: {0:?}")]
    SessionAlreadyOpen(SessionId),

    // Visual errors
    #[error("Nothing to render: empty ticket string")]
    EmptyInput,

    #[error("Payload exceeds QR capacity: {0} bytes")]
    PayloadTooLarge(usize),

    // Infrastructure failures
    #[error("Internal failure: {0}")]
    Internal(String),
}

/// Result type for roll-call operations
pub type RollcallResult<T> = Result<T, RollcallError>;
