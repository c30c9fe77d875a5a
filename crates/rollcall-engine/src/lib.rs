//! ROLLCALL Engine - Marking orchestrator and session lifecycle
//!
//! The engine sequences a scan request through the marking protocol:
//! 1. Validate the presented ticket against the session's current one
//! 2. Record the presence fact (idempotent check-and-insert)
//! 3. Rotate to a fresh ticket
//! 4. Fan out `PresenceRecorded` then `TicketRotated` to session observers
//!
//! An invalid ticket has zero observable side effects; a duplicate scan is
//! benign success and triggers neither rotation nor fan-out.

pub mod config;
pub mod directory;
pub mod engine;
pub mod stats;

pub use config::*;
pub use directory::*;
pub use engine::*;
pub use stats::*;
