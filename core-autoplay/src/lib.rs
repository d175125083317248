//! # Autoplay
//!
//! Drives play/pause for a scrollable list of playable items: the item with
//! the largest visible extent plays, everything else is paused, and selection
//! is re-evaluated when a scroll gesture settles.
//!
//! ## Components
//!
//! - [`VisibilityScorer`] - pure best-visible-candidate selection
//! - [`AutoplayCoordinator`] - selection timing and switching
//! - [`Playable`], [`Visible`], [`CandidateSource`], [`AutoplayDelegate`] -
//!   the capabilities the host list and its items provide
//!
//! [`PlaybackCoordinator`](core_playback::PlaybackCoordinator) implements
//! [`Playable`], so cells backed by one can be returned from
//! [`CandidateSource::candidate`] directly once they also implement
//! [`Visible`].

pub mod config;
pub mod coordinator;
pub mod geometry;
pub mod playback;
pub mod scorer;
pub mod traits;

pub use config::{AutoplayConfig, AutoplayError, Result};
pub use coordinator::AutoplayCoordinator;
pub use geometry::{Rect, Viewport};
pub use scorer::{VisibilityScorer, VisibleCandidate};
pub use traits::{AutoplayCandidate, AutoplayDelegate, CandidateSource, Playable, Visible};
