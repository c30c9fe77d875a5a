//! ROLLCALL Session Event Bus
//!
//! Per-session publish/subscribe fan-out over `tokio::sync::broadcast`.
//! Publish is fire-and-forget: a slow or disconnected observer never blocks
//! the publish path or other observers. For one session, every observer
//! sees events in publish order; nothing is guaranteed across sessions.
//! Observers get no backlog - a subscription starts at the next event.

pub mod bus;

pub use bus::*;
