//! Configuration for the gate service

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Gate service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// How long the barrier stays up before the compensating CLOSE
    pub open_pulse_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            open_pulse_ms: 3000,
        }
    }
}

impl Config {
    /// Open pulse as a [`Duration`]
    pub fn open_pulse(&self) -> Duration {
        Duration::from_millis(self.open_pulse_ms)
    }
}
