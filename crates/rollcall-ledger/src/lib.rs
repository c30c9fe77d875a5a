//! ROLLCALL Presence Ledger
//!
//! Append-only store of presence facts, keyed by `(session, participant)`.
//! The check-and-insert is a single operation under one lock acquisition -
//! the idempotence boundary of the whole marking flow. Records are never
//! mutated or deleted.

pub mod ledger;

pub use ledger::*;
