//! # Autoplay Configuration

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Autoplay errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AutoplayError {
    #[error("Invalid autoplay configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, AutoplayError>;

/// Autoplay coordinator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoplayConfig {
    /// Re-evaluate on every scroll while the user drags, instead of waiting
    /// for the gesture to settle.
    ///
    /// Default: false.
    #[serde(default)]
    pub play_while_dragging: bool,

    /// Visible extent (in points) a candidate must exceed to be chosen.
    ///
    /// Default: 0.0 (any visible part counts).
    #[serde(default)]
    pub min_visible_extent: f64,
}

impl Default for AutoplayConfig {
    fn default() -> Self {
        Self {
            play_while_dragging: false,
            min_visible_extent: 0.0,
        }
    }
}

impl AutoplayConfig {
    pub fn with_play_while_dragging(mut self, enabled: bool) -> Self {
        self.play_while_dragging = enabled;
        self
    }

    pub fn with_min_visible_extent(mut self, extent: f64) -> Self {
        self.min_visible_extent = extent;
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if !self.min_visible_extent.is_finite() || self.min_visible_extent < 0.0 {
            return Err(AutoplayError::InvalidConfig(
                "min_visible_extent must be a finite value >= 0".to_string(),
            ));
        }
        Ok(())
    }
}
