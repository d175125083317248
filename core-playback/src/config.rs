//! # Playback Configuration
//!
//! Configuration for a [`PlaybackCoordinator`](crate::PlaybackCoordinator).

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{PlaybackError, Result};

/// Playback coordinator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Rate used when a caller asks to play without naming one (autoplay).
    ///
    /// Default: 1.0.
    #[serde(default = "default_rate")]
    pub default_rate: f32,

    /// Seek back to zero after the item played to its end, when the item has
    /// a known positive duration.
    ///
    /// Default: true.
    #[serde(default = "default_rewind_on_end")]
    pub rewind_on_end: bool,

    /// Periodic time subscription armed when the coordinator starts.
    ///
    /// Default: none.
    #[serde(default)]
    pub periodic_interval: Option<Duration>,

    /// Forward loaded-range changes as `TimeEvent::Buffer`.
    ///
    /// Default: true.
    #[serde(default = "default_emit_buffer_events")]
    pub emit_buffer_events: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            default_rate: default_rate(),
            rewind_on_end: default_rewind_on_end(),
            periodic_interval: None,
            emit_buffer_events: default_emit_buffer_events(),
        }
    }
}

impl PlaybackConfig {
    pub fn with_default_rate(mut self, rate: f32) -> Self {
        self.default_rate = rate;
        self
    }

    pub fn with_rewind_on_end(mut self, rewind: bool) -> Self {
        self.rewind_on_end = rewind;
        self
    }

    pub fn with_periodic_interval(mut self, interval: Duration) -> Self {
        self.periodic_interval = Some(interval);
        self
    }

    pub fn with_buffer_events(mut self, enabled: bool) -> Self {
        self.emit_buffer_events = enabled;
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        validate_rate(self.default_rate)
            .map_err(|_| PlaybackError::InvalidConfig("default_rate must be > 0".to_string()))?;

        if self.periodic_interval == Some(Duration::ZERO) {
            return Err(PlaybackError::InvalidConfig(
                "periodic_interval must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Reject rates the engine cannot honor.
pub(crate) fn validate_rate(rate: f32) -> Result<()> {
    if rate.is_finite() && rate > 0.0 {
        Ok(())
    } else {
        Err(PlaybackError::InvalidRate(rate))
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_rate() -> f32 {
    1.0
}

fn default_rewind_on_end() -> bool {
    true
}

fn default_emit_buffer_events() -> bool {
    true
}
