//! Controller configuration.
//!
//! Connection and scheduling parameters supplied by the experiment harness.
//! The device path itself is the caller's problem (port discovery is
//! external); everything here is how to drive the link once a path exists.

use serde::{Deserialize, Serialize};

/// Connection and reward-scheduling parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Serial baud rate.
    pub baud_rate: u32,
    /// Blocking-read timeout on the serial channel, in milliseconds.
    pub read_timeout_ms: u64,
    /// Target fraction of honored reward attempts (0–100).
    pub contingency_percent: u8,
    /// Full reward magnitude.
    pub base_size: i16,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            baud_rate: 19_200,
            read_timeout_ms: 1_000,
            contingency_percent: 80,
            base_size: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let c = ControllerConfig::default();
        assert!(c.baud_rate > 0);
        assert!(c.read_timeout_ms > 0);
        assert!(c.contingency_percent <= 100);
        assert!(c.base_size > 0);
    }
}
