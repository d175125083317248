//! # Playback Coordination
//!
//! Wraps an opaque, callback-driven [`MediaEngine`](bridge_traits::MediaEngine)
//! and exposes a race-free playback/buffering state machine.
//!
//! ## Overview
//!
//! - [`PlayableResource`] - one playable item and its immutable identity
//! - [`TimeObservationRegistry`] - periodic and boundary time subscriptions
//! - [`PlaybackStateMachine`] - raw engine signals to deduplicated
//!   [`Status`]/[`BufferStatus`] transitions
//! - [`PlaybackCoordinator`] - the player: resource swapping, seek
//!   arbitration, observer fan-out
//! - [`EngineRegistry`] - keeps one engine from being driven by two coordinators
//!
//! ## Example
//!
//! ```rust,ignore
//! use core_playback::{PlayableResource, PlaybackCoordinator};
//! use std::time::Duration;
//!
//! let player = PlaybackCoordinator::builder()
//!     .engine(engine)
//!     .observer(observer)
//!     .build()?;
//!
//! player.attach(PlayableResource::remote("https://cdn.example.com/clip.m3u8"))?;
//! player.play(1.0)?;
//! player.seek(Duration::from_secs(30)).await?;
//! player.clear().await?;
//! ```

pub mod config;
pub mod coordinator;
pub mod error;
pub mod observer;
pub mod registry;
pub mod resource;
pub mod seek;
pub mod state_machine;
pub mod status;
pub mod time_observer;
pub mod timing;

#[cfg(test)]
mod test_support;

pub use config::PlaybackConfig;
pub use coordinator::{PlaybackCoordinator, PlaybackCoordinatorBuilder, PlaybackSnapshot};
pub use error::{PlaybackError, Result, SeekFailureReason};
pub use observer::{NoopObserver, PlaybackObserver};
pub use registry::{EngineClaim, EngineRegistry};
pub use resource::{PlayableResource, ResourceId};
pub use seek::{SeekCompletion, SeekRequest};
pub use state_machine::{PlaybackStateMachine, StateChange, Transition};
pub use status::{BufferStatus, FailureKind, PlaybackFailure, Status};
pub use time_observer::{TimeEvent, TimeObservationRegistry, TimeSubscription, TimeSubscriptionKind};
