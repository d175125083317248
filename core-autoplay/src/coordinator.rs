//! # Autoplay Coordinator
//!
//! Decides which single candidate of a scrolling list should be playing.
//!
//! ## When selection runs
//!
//! A drag gesture reports
//! `will_begin_dragging → did_scroll* → will_end_dragging → did_end_dragging(decelerate)`
//! and, when `decelerate` is true, continues with
//! `will_begin_decelerating → did_end_decelerating`. The gesture settles
//! exactly once: at `did_end_dragging(false)` or at `did_end_decelerating`,
//! whichever ends it. A single `is_drag_scrolling` flag, raised when the drag
//! begins and lowered by the settling event, guarantees one evaluation per
//! gesture.
//!
//! While dragging, `did_scroll` re-evaluates only if
//! [`AutoplayConfig::play_while_dragging`] is set.
//!
//! ## Switching
//!
//! If the best candidate is already the current one it is only told to play
//! when it is not playing. Otherwise the old candidate is paused, the new one
//! is played and the delegate is told about the switch.

use core_runtime::events::{AutoplayEvent, CoreEvent, EventBus};
use std::fmt::Debug;
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

use crate::config::{AutoplayConfig, Result};
use crate::scorer::{VisibilityScorer, VisibleCandidate};
use crate::traits::{AutoplayDelegate, CandidateSource};

/// Chooses and drives the playing candidate of one list.
///
/// Holds the list and the delegate weakly; once either is gone the
/// corresponding calls become no-ops.
pub struct AutoplayCoordinator<Id> {
    source: Weak<dyn CandidateSource<Id>>,
    delegate: Option<Weak<dyn AutoplayDelegate<Id>>>,
    event_bus: Option<EventBus>,
    config: AutoplayConfig,
    scorer: VisibilityScorer,
    current: Option<Id>,
    is_drag_scrolling: bool,
    is_autoplay_suspended: bool,
}

impl<Id> AutoplayCoordinator<Id>
where
    Id: Clone + PartialEq + Debug + 'static,
{
    /// Coordinator for `source` with the default configuration.
    pub fn new<S>(source: &Arc<S>) -> Self
    where
        S: CandidateSource<Id> + 'static,
    {
        let source = Arc::downgrade(source);
        let source: Weak<dyn CandidateSource<Id>> = source;
        let config = AutoplayConfig::default();
        Self {
            source,
            delegate: None,
            event_bus: None,
            scorer: VisibilityScorer::with_min_visible_extent(config.min_visible_extent),
            config,
            current: None,
            is_drag_scrolling: false,
            is_autoplay_suspended: false,
        }
    }

    pub fn with_config(mut self, config: AutoplayConfig) -> Result<Self> {
        config.validate()?;
        self.scorer = VisibilityScorer::with_min_visible_extent(config.min_visible_extent);
        self.config = config;
        Ok(self)
    }

    pub fn with_delegate<D>(mut self, delegate: &Arc<D>) -> Self
    where
        D: AutoplayDelegate<Id> + 'static,
    {
        let delegate = Arc::downgrade(delegate);
        let delegate: Weak<dyn AutoplayDelegate<Id>> = delegate;
        self.delegate = Some(delegate);
        self
    }

    /// Mirror switches and suspension changes onto `event_bus`.
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn config(&self) -> &AutoplayConfig {
        &self.config
    }

    /// Identity of the candidate currently selected for playback.
    pub fn current_playing(&self) -> Option<&Id> {
        self.current.as_ref()
    }

    pub fn is_drag_scrolling(&self) -> bool {
        self.is_drag_scrolling
    }

    pub fn is_autoplay_suspended(&self) -> bool {
        self.is_autoplay_suspended
    }

    // ------------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------------

    /// Score the visible candidates and make the best one the playing one.
    ///
    /// While autoplay is suspended the current candidate is paused instead.
    pub fn play_best(&mut self) {
        let Some(source) = self.source.upgrade() else {
            trace!("Candidate source dropped");
            return;
        };

        if self.is_autoplay_suspended {
            if let Some(current) = &self.current {
                if let Some(candidate) = source.candidate(current) {
                    debug!(identity = ?current, "Autoplay suspended, pausing");
                    candidate.pause();
                }
            }
            return;
        }

        let viewport = source.viewport();
        let visible: Vec<VisibleCandidate<Id>> = source
            .candidates()
            .into_iter()
            .filter_map(|identity| {
                let frame = source.candidate(&identity)?.frame_in_viewport();
                Some(VisibleCandidate::new(identity, frame))
            })
            .collect();

        let Some(best) = self.scorer.best(&viewport, &visible) else {
            trace!(candidates = visible.len(), "No visible candidate");
            return;
        };
        let best = best.identity.clone();

        if self.current.as_ref() == Some(&best) {
            if let Some(candidate) = source.candidate(&best) {
                if !candidate.is_playing() {
                    debug!(identity = ?best, "Resuming current candidate");
                    candidate.play();
                }
            }
            return;
        }

        let Some(candidate) = source.candidate(&best) else {
            debug!(identity = ?best, "Candidate disappeared before it could play");
            return;
        };

        let previous = self.current.replace(best.clone());
        if let Some(previous) = &previous {
            if let Some(old) = source.candidate(previous) {
                old.pause();
            }
        }
        candidate.play();
        debug!(from = ?previous, to = ?best, "Autoplay switched");

        if let Some(delegate) = self.delegate.as_ref().and_then(Weak::upgrade) {
            delegate.on_switch(&best);
        }
        self.emit(AutoplayEvent::Switched {
            from: previous.map(|id| format!("{:?}", id)),
            to: format!("{:?}", best),
        });
    }

    /// Re-evaluate now unless a drag is in progress (data reloaded, layout
    /// changed, screen appeared).
    pub fn reload(&mut self) {
        if !self.is_drag_scrolling {
            self.play_best();
        }
    }

    /// Pause the current candidate and forget it.
    pub fn stop(&mut self) {
        let Some(current) = self.current.take() else {
            return;
        };
        if let Some(candidate) = self.source.upgrade().and_then(|s| s.candidate(&current)) {
            candidate.pause();
        }
        debug!(identity = ?current, "Autoplay stopped");
        self.emit(AutoplayEvent::Stopped {
            identity: format!("{:?}", current),
        });
    }

    /// The item for `identity` left the screen.
    pub fn did_end_displaying(&mut self, identity: &Id) {
        if self.current.as_ref() == Some(identity) {
            self.stop();
        }
    }

    /// Suspend or resume autoplay.
    ///
    /// Takes effect immediately unless a drag is in progress, in which case
    /// the gesture's settlement applies it.
    pub fn set_autoplay_suspended(&mut self, suspended: bool) {
        if self.is_autoplay_suspended != suspended {
            self.is_autoplay_suspended = suspended;
            debug!(suspended, "Autoplay suspension changed");
            self.emit(AutoplayEvent::SuspensionChanged { suspended });
        }
        if !self.is_drag_scrolling {
            self.play_best();
        }
    }

    // ------------------------------------------------------------------------
    // Scroll phases
    // ------------------------------------------------------------------------

    pub fn will_begin_dragging(&mut self) {
        trace!("Drag began");
        self.is_drag_scrolling = true;
    }

    pub fn did_scroll(&mut self) {
        if self.is_drag_scrolling && self.config.play_while_dragging {
            self.play_best();
        }
    }

    pub fn will_end_dragging(&mut self) {
        trace!("Drag ending");
    }

    pub fn did_end_dragging(&mut self, will_decelerate: bool) {
        if !will_decelerate {
            self.settle();
        }
    }

    pub fn will_begin_decelerating(&mut self) {
        trace!("Deceleration began");
    }

    pub fn did_end_decelerating(&mut self) {
        self.settle();
    }

    /// End of a gesture: evaluate once, and only for a gesture that began as
    /// a drag.
    fn settle(&mut self) {
        if !self.is_drag_scrolling {
            return;
        }
        self.is_drag_scrolling = false;
        trace!("Scroll settled");
        self.play_best();
    }

    fn emit(&self, event: AutoplayEvent) {
        if let Some(bus) = &self.event_bus {
            let _ = bus.emit(CoreEvent::Autoplay(event));
        }
    }
}

impl<Id: Debug> Debug for AutoplayCoordinator<Id> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoplayCoordinator")
            .field("current", &self.current)
            .field("is_drag_scrolling", &self.is_drag_scrolling)
            .field("is_autoplay_suspended", &self.is_autoplay_suspended)
            .field("config", &self.config)
            .finish()
    }
}
