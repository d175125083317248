//! Media engine bridge trait and the raw signal vocabulary it speaks.
//!
//! The engine is the opaque platform primitive that actually decodes and
//! renders media (AVPlayer, GStreamer, an `HTMLMediaElement`, ...). The core
//! never talks to it directly beyond this contract: commands go in through
//! [`MediaEngine`], and everything the engine wants to report comes back as an
//! [`EngineSignal`] or a time callback.
//!
//! ## Threading
//!
//! Engines are free to invoke registered callbacks from any thread or queue,
//! in any interleaving. Consumers must not assume callbacks arrive on the
//! thread that registered them; `core-playback` funnels every callback onto a
//! single task before touching state.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Sources
// ============================================================================

/// Location of a playable item, handed to [`MediaEngine::load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    /// Remote HTTP(S) media (progressive download or HLS playlist).
    RemoteStream {
        url: String,
        headers: HashMap<String, String>,
    },
    /// Media file accessible to the host runtime.
    LocalFile { path: PathBuf },
}

impl MediaSource {
    /// Remote source without extra request headers.
    pub fn remote(url: impl Into<String>) -> Self {
        MediaSource::RemoteStream {
            url: url.into(),
            headers: HashMap::new(),
        }
    }

    /// Determine whether the source represents remote content.
    pub fn is_remote(&self) -> bool {
        matches!(self, MediaSource::RemoteStream { .. })
    }

    /// Human-readable locator (URL or path), unredacted.
    pub fn locator(&self) -> String {
        match self {
            MediaSource::RemoteStream { url, .. } => url.clone(),
            MediaSource::LocalFile { path } => path.display().to_string(),
        }
    }
}

// ============================================================================
// Raw signals
// ============================================================================

/// Error details attached to failure signals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineErrorInfo {
    /// Platform error code, when the engine exposes one.
    pub code: Option<i64>,
    /// Localized description reported by the engine.
    pub message: String,
}

impl EngineErrorInfo {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(mut self, code: i64) -> Self {
        self.code = Some(code);
        self
    }
}

impl fmt::Display for EngineErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{} (code {})", self.message, code),
            None => f.write_str(&self.message),
        }
    }
}

/// Status of the engine itself, independent of the loaded item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawEngineStatus {
    Unknown,
    ReadyToPlay,
    Failed(EngineErrorInfo),
}

/// Status of the currently loaded item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawItemStatus {
    Unknown,
    ReadyToPlay,
    Failed(EngineErrorInfo),
}

/// Rate-control state reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawTimeControl {
    Paused,
    /// The engine wants to play but is waiting (usually for data).
    WaitingToPlayAtRate,
    Playing,
}

/// A contiguous span of loaded media, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRange {
    pub start: f64,
    pub duration: f64,
}

impl TimeRange {
    pub fn new(start: f64, duration: f64) -> Self {
        Self { start, duration }
    }

    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Everything the engine can report through a signal observer.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineSignal {
    EngineStatusChanged(RawEngineStatus),
    ItemStatusChanged(RawItemStatus),
    TimeControlChanged {
        status: RawTimeControl,
        /// Whether the engine predicts playback will keep up with buffering.
        likely_to_keep_up: bool,
    },
    PlaybackBufferEmpty,
    PlaybackLikelyToKeepUp,
    PlaybackBufferFull,
    LoadedTimeRangesChanged(Vec<TimeRange>),
    PlayedToEnd,
    FailedToPlayToEnd(EngineErrorInfo),
}

impl EngineSignal {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            EngineSignal::EngineStatusChanged(_) => "engine_status_changed",
            EngineSignal::ItemStatusChanged(_) => "item_status_changed",
            EngineSignal::TimeControlChanged { .. } => "time_control_changed",
            EngineSignal::PlaybackBufferEmpty => "playback_buffer_empty",
            EngineSignal::PlaybackLikelyToKeepUp => "playback_likely_to_keep_up",
            EngineSignal::PlaybackBufferFull => "playback_buffer_full",
            EngineSignal::LoadedTimeRangesChanged(_) => "loaded_time_ranges_changed",
            EngineSignal::PlayedToEnd => "played_to_end",
            EngineSignal::FailedToPlayToEnd(_) => "failed_to_play_to_end",
        }
    }
}

// ============================================================================
// Observer registration
// ============================================================================

/// Handle returned by observer registration, used to unregister later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverToken(u64);

impl ObserverToken {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Callback receiving engine signals. May be called from any thread.
pub type SignalCallback = Arc<dyn Fn(EngineSignal) + Send + Sync>;

/// Callback receiving the engine's current time (seconds) when a time
/// observer fires. May be called from any thread.
pub type TimeCallback = Arc<dyn Fn(f64) + Send + Sync>;

// ============================================================================
// Engine trait
// ============================================================================

/// Platform media engine driven by `core-playback`.
///
/// One engine instance is owned by exactly one playback coordinator at a time.
/// Implementations must tolerate `remove_observer` being called with a token
/// that already fired its last callback, and must stop invoking a callback
/// once its token has been removed (best effort; the coordinator filters
/// stragglers regardless).
#[async_trait::async_trait]
pub trait MediaEngine: Send + Sync {
    /// Bind `source` as the current item and prepare it for playback.
    ///
    /// Resolves once asset preparation finished. Readiness to play is still
    /// reported separately through [`RawItemStatus::ReadyToPlay`].
    async fn load(&self, source: &MediaSource) -> Result<()>;

    /// Abort any in-progress [`load`](Self::load).
    fn cancel_loading(&self);

    /// Release the current item.
    fn unload(&self);

    /// Start playback at `rate` (1.0 = normal speed).
    fn set_rate(&self, rate: f32);

    /// Pause playback.
    fn pause(&self);

    /// Current playback rate; 0.0 while paused.
    fn rate(&self) -> f32;

    /// Seek to `position` within the given tolerances.
    ///
    /// Returns `false` if the seek was interrupted or did not finish.
    async fn seek(
        &self,
        position: Duration,
        tolerance_before: Duration,
        tolerance_after: Duration,
    ) -> bool;

    /// Cancel every outstanding seek.
    fn cancel_pending_seeks(&self);

    /// Current playback position in seconds.
    fn current_time(&self) -> f64;

    /// Duration of the current item in seconds. NaN or infinite when unknown
    /// or unbounded (live streams).
    fn duration(&self) -> f64;

    /// Ranges of the current item that are loaded.
    fn loaded_time_ranges(&self) -> Vec<TimeRange>;

    /// Register for engine/item status, rate and buffer signals.
    fn add_signal_observer(&self, callback: SignalCallback) -> ObserverToken;

    /// Invoke `callback` every `interval` of playback time.
    fn add_periodic_time_observer(&self, interval: Duration, callback: TimeCallback)
        -> ObserverToken;

    /// Invoke `callback` whenever playback crosses one of `times`.
    fn add_boundary_time_observer(&self, times: Vec<Duration>, callback: TimeCallback)
        -> ObserverToken;

    /// Unregister a signal or time observer.
    fn remove_observer(&self, token: ObserverToken);
}
