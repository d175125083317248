//! # Host Bridge Traits
//!
//! Capability contracts that each host platform implements for the playback core.
//!
//! ## Traits
//!
//! - [`MediaEngine`](engine::MediaEngine) - The opaque platform media player
//!   (load, rate control, seeking, observers for status/buffer/time signals)
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Engine                     |
//! |----------|----------------------------|
//! | iOS      | AVPlayer adapter           |
//! | Android  | ExoPlayer adapter          |
//! | Desktop  | GStreamer adapter          |
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Platform
//! implementations should convert native errors into it and keep the engine's
//! own description in the message.
//!
//! ## Thread Safety
//!
//! Bridge traits require `Send + Sync`. Engine callbacks may fire on any thread.

pub mod engine;
pub mod error;
pub mod logging;

pub use error::BridgeError;

pub use engine::{
    EngineErrorInfo, EngineSignal, MediaEngine, MediaSource, ObserverToken, RawEngineStatus,
    RawItemStatus, RawTimeControl, SignalCallback, TimeCallback, TimeRange,
};
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
