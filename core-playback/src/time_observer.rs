//! # Time Observation
//!
//! Tracks the periodic and boundary time subscriptions a coordinator wants and
//! keeps at most one of each registered with the engine.
//!
//! Subscriptions are requested independently of whether a resource is
//! attached. While the registry is *armed* (a resource is attached) every
//! change is applied to the engine immediately, always unregistering the old
//! observer before registering its replacement. Disarming removes everything
//! from the engine but remembers the requested subscriptions so the next
//! attach can re-arm them.

use bridge_traits::{MediaEngine, ObserverToken, TimeCallback};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::debug;

use crate::error::{PlaybackError, Result};

/// A requested time subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeSubscription {
    /// Fire every `interval` of playback time.
    Periodic(Duration),
    /// Fire when playback crosses any of the given times.
    Boundary(BTreeSet<Duration>),
}

impl TimeSubscription {
    pub fn kind(&self) -> TimeSubscriptionKind {
        match self {
            TimeSubscription::Periodic(_) => TimeSubscriptionKind::Periodic,
            TimeSubscription::Boundary(_) => TimeSubscriptionKind::Boundary,
        }
    }
}

/// Discriminant of a [`TimeSubscription`], used to route engine callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeSubscriptionKind {
    Periodic,
    Boundary,
}

/// Time notification delivered to playback observers.
///
/// Each variant carries `(time, duration)`; the duration is `None` while the
/// engine does not know it. For `Buffer` the time is how far the current item
/// has been loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeEvent {
    Buffer(Duration, Option<Duration>),
    Periodic(Duration, Option<Duration>),
    Boundary(Duration, Option<Duration>),
}

impl TimeEvent {
    pub fn time(&self) -> Duration {
        match self {
            TimeEvent::Buffer(t, _) | TimeEvent::Periodic(t, _) | TimeEvent::Boundary(t, _) => *t,
        }
    }

    pub fn duration(&self) -> Option<Duration> {
        match self {
            TimeEvent::Buffer(_, d) | TimeEvent::Periodic(_, d) | TimeEvent::Boundary(_, d) => *d,
        }
    }
}

/// Builds the engine callback for a subscription kind.
pub type TimeCallbackFactory<'a> = &'a dyn Fn(TimeSubscriptionKind) -> TimeCallback;

/// Registration bookkeeping for time observers.
#[derive(Debug, Default)]
pub struct TimeObservationRegistry {
    periodic: Option<Duration>,
    boundary: BTreeSet<Duration>,
    periodic_token: Option<ObserverToken>,
    boundary_token: Option<ObserverToken>,
    armed: bool,
}

impl TimeObservationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requested periodic interval.
    pub fn periodic_interval(&self) -> Option<Duration> {
        self.periodic
    }

    /// Requested boundary times.
    pub fn boundary_times(&self) -> &BTreeSet<Duration> {
        &self.boundary
    }

    /// Requested subscriptions, periodic first.
    pub fn subscriptions(&self) -> Vec<TimeSubscription> {
        let mut subscriptions = Vec::with_capacity(2);
        if let Some(interval) = self.periodic {
            subscriptions.push(TimeSubscription::Periodic(interval));
        }
        if !self.boundary.is_empty() {
            subscriptions.push(TimeSubscription::Boundary(self.boundary.clone()));
        }
        subscriptions
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Number of observers currently registered with the engine.
    pub fn registered_count(&self) -> usize {
        usize::from(self.periodic_token.is_some()) + usize::from(self.boundary_token.is_some())
    }

    /// Replace the periodic subscription; `None` removes it.
    pub fn set_periodic(
        &mut self,
        interval: Option<Duration>,
        engine: &dyn MediaEngine,
        callbacks: TimeCallbackFactory<'_>,
    ) -> Result<()> {
        if interval == Some(Duration::ZERO) {
            return Err(PlaybackError::InvalidConfig(
                "periodic interval must be > 0".to_string(),
            ));
        }

        self.periodic = interval;
        if self.armed {
            self.unregister_periodic(engine);
            self.register_periodic(engine, callbacks);
        }
        Ok(())
    }

    /// Replace the boundary subscription; an empty set removes it.
    pub fn set_boundary(
        &mut self,
        times: BTreeSet<Duration>,
        engine: &dyn MediaEngine,
        callbacks: TimeCallbackFactory<'_>,
    ) {
        self.boundary = times;
        if self.armed {
            self.unregister_boundary(engine);
            self.register_boundary(engine, callbacks);
        }
    }

    /// Register every requested subscription with the engine.
    pub fn arm(&mut self, engine: &dyn MediaEngine, callbacks: TimeCallbackFactory<'_>) {
        if self.armed {
            self.disarm(engine);
        }
        self.armed = true;
        self.register_periodic(engine, callbacks);
        self.register_boundary(engine, callbacks);
    }

    /// Remove every registered observer, keeping the requested subscriptions.
    pub fn disarm(&mut self, engine: &dyn MediaEngine) {
        self.unregister_periodic(engine);
        self.unregister_boundary(engine);
        self.armed = false;
    }

    fn register_periodic(&mut self, engine: &dyn MediaEngine, callbacks: TimeCallbackFactory<'_>) {
        if let Some(interval) = self.periodic {
            let token =
                engine.add_periodic_time_observer(interval, callbacks(TimeSubscriptionKind::Periodic));
            debug!(?interval, token = token.raw(), "Registered periodic time observer");
            self.periodic_token = Some(token);
        }
    }

    fn register_boundary(&mut self, engine: &dyn MediaEngine, callbacks: TimeCallbackFactory<'_>) {
        if !self.boundary.is_empty() {
            let times: Vec<Duration> = self.boundary.iter().copied().collect();
            let count = times.len();
            let token =
                engine.add_boundary_time_observer(times, callbacks(TimeSubscriptionKind::Boundary));
            debug!(count, token = token.raw(), "Registered boundary time observer");
            self.boundary_token = Some(token);
        }
    }

    fn unregister_periodic(&mut self, engine: &dyn MediaEngine) {
        if let Some(token) = self.periodic_token.take() {
            engine.remove_observer(token);
        }
    }

    fn unregister_boundary(&mut self, engine: &dyn MediaEngine) {
        if let Some(token) = self.boundary_token.take() {
            engine.remove_observer(token);
        }
    }
}
