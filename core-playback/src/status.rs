//! Playback lifecycle and buffering status values.

use bridge_traits::EngineErrorInfo;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::PlaybackError;

/// Which side reported a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    /// The engine itself failed; every resource on it is affected.
    Engine,
    /// The attached item failed to load or play.
    Resource,
}

/// A terminal playback failure.
///
/// Two failures are equal when they have the same kind and description. The
/// engine's numeric code is carried for diagnostics but ignored by equality,
/// so an engine re-reporting the same error with a different code does not
/// produce a second `Failed` transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackFailure {
    pub kind: FailureKind,
    pub message: String,
    pub code: Option<i64>,
}

impl PlaybackFailure {
    pub fn engine(info: &EngineErrorInfo) -> Self {
        Self {
            kind: FailureKind::Engine,
            message: info.message.clone(),
            code: info.code,
        }
    }

    pub fn resource(info: &EngineErrorInfo) -> Self {
        Self {
            kind: FailureKind::Resource,
            message: info.message.clone(),
            code: info.code,
        }
    }

    /// The failure as an error value.
    pub fn to_error(&self) -> PlaybackError {
        match self.kind {
            FailureKind::Engine => PlaybackError::EngineFailure(self.message.clone()),
            FailureKind::Resource => PlaybackError::ResourceFailure(self.message.clone()),
        }
    }
}

impl PartialEq for PlaybackFailure {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.message == other.message
    }
}

impl Eq for PlaybackFailure {}

impl fmt::Display for PlaybackFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            FailureKind::Engine => "engine",
            FailureKind::Resource => "resource",
        };
        write!(f, "{} failure: {}", kind, self.message)
    }
}

/// Playback lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Unknown,
    ReadyToPlay,
    Playing,
    Paused,
    PlayedToEnd,
    Failed(PlaybackFailure),
}

impl Status {
    pub fn is_failed(&self) -> bool {
        matches!(self, Status::Failed(_))
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, Status::Playing)
    }

    /// Short label used in logs and events.
    pub fn label(&self) -> &'static str {
        match self {
            Status::Unknown => "unknown",
            Status::ReadyToPlay => "ready_to_play",
            Status::Playing => "playing",
            Status::Paused => "paused",
            Status::PlayedToEnd => "played_to_end",
            Status::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Failed(failure) => write!(f, "failed ({})", failure),
            other => f.write_str(other.label()),
        }
    }
}

/// Whether enough media is available to play without stalling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BufferStatus {
    #[default]
    Unknown,
    Buffering,
    ReadyToPlay,
    Full,
}

impl BufferStatus {
    pub fn label(&self) -> &'static str {
        match self {
            BufferStatus::Unknown => "unknown",
            BufferStatus::Buffering => "buffering",
            BufferStatus::ReadyToPlay => "ready_to_play",
            BufferStatus::Full => "full",
        }
    }
}

impl fmt::Display for BufferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
