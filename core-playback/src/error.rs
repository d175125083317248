//! # Playback Error Types

use std::fmt;
use thiserror::Error;

/// Why a seek completion reported failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekFailureReason {
    /// The engine reported that the seek did not finish.
    NotFinished,
    /// The seek was cancelled by `clear()` or by attaching a new resource.
    Cancelled,
    /// A newer seek replaced this one while it was still queued.
    Superseded,
}

impl fmt::Display for SeekFailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SeekFailureReason::NotFinished => "engine did not finish the seek",
            SeekFailureReason::Cancelled => "cancelled",
            SeekFailureReason::Superseded => "superseded by a newer seek",
        };
        f.write_str(text)
    }
}

/// Errors that can occur during playback operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaybackError {
    // ========================================================================
    // Engine / Resource Errors
    // ========================================================================
    /// The underlying engine reported a failure.
    #[error("Engine failure: {0}")]
    EngineFailure(String),

    /// The loaded item reported a failure.
    #[error("Resource failure: {0}")]
    ResourceFailure(String),

    // ========================================================================
    // Playback Control Errors
    // ========================================================================
    /// A seek did not complete.
    #[error("Seek failed: {0}")]
    SeekFailure(SeekFailureReason),

    /// Operation attempted with nothing attached.
    #[error("No resource attached")]
    NoResource,

    /// Playback rate must be finite and positive.
    #[error("Invalid playback rate: {0}")]
    InvalidRate(f32),

    // ========================================================================
    // Setup Errors
    // ========================================================================
    #[error("Invalid playback configuration: {0}")]
    InvalidConfig(String),

    /// Another coordinator already observes this engine instance.
    #[error("Engine is already owned by another coordinator")]
    EngineInUse,

    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    /// The coordinator task is gone (handle outlived a runtime shutdown).
    #[error("Playback coordinator is closed")]
    CoordinatorClosed,
}

impl PlaybackError {
    /// Returns `true` for failures that end playback of the current resource.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PlaybackError::EngineFailure(_) | PlaybackError::ResourceFailure(_)
        )
    }

    /// Returns `true` if this is any kind of seek failure.
    pub fn is_seek_failure(&self) -> bool {
        matches!(self, PlaybackError::SeekFailure(_))
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
