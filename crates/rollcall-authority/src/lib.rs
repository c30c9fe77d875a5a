//! ROLLCALL Ticket Authority
//!
//! Owns the current ticket for every open session. Minting and rotation
//! replace the current ticket under a per-session versioned slot, so "last
//! rotation wins" is an explicit committed version, not an accident of
//! scheduling. A superseded ticket is permanently invalid.

pub mod authority;

pub use authority::*;
