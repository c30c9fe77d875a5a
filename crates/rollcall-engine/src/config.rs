//! Engine configuration

use std::time::Duration;

/// Roll-call engine configuration
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Base URL the QR mark links point at
    pub base_url: String,
    /// TTL of the opening ticket. Long-lived: the host may open the session
    /// well before participants start scanning.
    pub initial_ttl: Duration,
    /// TTL of every rotated ticket. Short relative to scan-to-rotate
    /// latency, so a photographed code is useless beyond the rotation
    /// window.
    pub rotation_ttl: Duration,
    /// Per-session event channel capacity
    pub bus_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            base_url: "http://localhost:3000".to_string(),
            initial_ttl: Duration::from_secs(30 * 60),
            rotation_ttl: Duration::from_secs(30),
            bus_capacity: rollcall_bus::DEFAULT_CAPACITY,
        }
    }
}
