//! Capabilities the autoplay coordinator consumes and exposes.
//!
//! The coordinator never owns list items. It reaches them through a
//! [`CandidateSource`] held weakly, looks each candidate up by identity every
//! time it needs one, and simply skips identities that no longer resolve.

use std::sync::Arc;

use crate::geometry::{Rect, Viewport};

/// Something that can be played and paused.
pub trait Playable {
    fn is_playing(&self) -> bool;

    fn play(&self);

    fn pause(&self);
}

/// Something that occupies a frame inside the scrolling viewport.
pub trait Visible {
    /// Current frame, converted into the viewport's coordinate space.
    fn frame_in_viewport(&self) -> Rect;
}

/// A list item eligible for autoplay.
pub trait AutoplayCandidate: Playable + Visible {}

impl<T: Playable + Visible + ?Sized> AutoplayCandidate for T {}

/// The scrollable list, as seen by the autoplay coordinator.
pub trait CandidateSource<Id> {
    /// Currently visible bounds.
    fn viewport(&self) -> Viewport;

    /// Identities of the items currently on screen, in scan order
    /// (top to bottom).
    fn candidates(&self) -> Vec<Id>;

    /// Look up a candidate. `None` when the item is gone or not playable.
    fn candidate(&self, identity: &Id) -> Option<Arc<dyn AutoplayCandidate>>;
}

/// Receives autoplay decisions.
pub trait AutoplayDelegate<Id> {
    /// A different candidate started playing.
    fn on_switch(&self, identity: &Id);
}
