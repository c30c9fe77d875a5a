//! ROLLCALL Credential - Signed session tickets
//!
//! A ticket is a signed, time-boxed capability proving "the holder observed
//! the display for session S". This crate provides:
//! - Key management for the issuing host (Ed25519)
//! - The tamper-evident wire form: encode to a scannable string, decode with
//!   fail-closed verification

pub mod codec;
pub mod key;

pub use codec::*;
pub use key::*;
