//! ROLLCALL Core - Fundamental types and primitives
//!
//! This crate defines the core types used throughout the roll-call engine:
//! - Identifiers (SessionId, ParticipantId)
//! - Time primitives (Timestamp)
//! - Presence records and display artifacts
//! - Session events
//! - Error taxonomy

pub mod error;
pub mod event;
pub mod id;
pub mod record;
pub mod time;

pub use error::*;
pub use event::*;
pub use id::*;
pub use record::*;
pub use time::*;
