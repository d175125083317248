//! # Event Bus System
//!
//! Typed broadcast of playback and autoplay notifications using
//! `tokio::sync::broadcast`.
//!
//! The coordinators deliver their primary callbacks through observer/delegate
//! traits. The event bus is a secondary, fan-out mirror of the same facts for
//! hosts that prefer a single stream (analytics, debugging overlays, tests).
//!
//! ```text
//! ┌─────────────────────┐   emit   ┌──────────┐  subscribe  ┌────────────┐
//! │ PlaybackCoordinator ├─────────>│          ├────────────>│ Subscriber │
//! └─────────────────────┘          │ EventBus │             └────────────┘
//! ┌─────────────────────┐   emit   │          │  subscribe  ┌────────────┐
//! │ AutoplayCoordinator ├─────────>│          ├────────────>│ Subscriber │
//! └─────────────────────┘          └──────────┘             └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(64);
//! let mut rx = bus.subscribe();
//!
//! bus.emit(CoreEvent::Playback(PlaybackEvent::Cleared)).ok();
//! assert_eq!(rx.recv().await.unwrap(), CoreEvent::Playback(PlaybackEvent::Cleared));
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber fell behind and missed `n` events.
//!   Non-fatal; keep receiving.
//! - **`RecvError::Closed`**: every sender was dropped. Treat as shutdown.
//!
//! Emitting with no subscribers returns `Err`; publishers ignore it.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event published on the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    Playback(PlaybackEvent),
    Autoplay(AutoplayEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Playback(e) => e.description(),
            CoreEvent::Autoplay(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Playback(PlaybackEvent::StatusChanged { new, .. })
                if new.starts_with("failed") =>
            {
                EventSeverity::Error
            }
            CoreEvent::Playback(PlaybackEvent::SeekCompleted { finished: false, .. }) => {
                EventSeverity::Warning
            }
            CoreEvent::Playback(PlaybackEvent::ResourceAttached { .. })
            | CoreEvent::Autoplay(AutoplayEvent::Switched { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Playback Events
// ============================================================================

/// Mirror of what a playback coordinator reports to its observers.
///
/// Status values are carried as their display labels (`"playing"`,
/// `"failed (resource failure: <reason>)"`, ...) so this crate stays independent of
/// `core-playback`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// A resource was bound to the coordinator.
    ResourceAttached {
        resource_id: String,
        /// Redacted locator of the resource.
        locator: String,
    },
    /// Playback status transitioned.
    StatusChanged {
        resource_id: Option<String>,
        old: String,
        new: String,
    },
    /// Buffer status transitioned.
    BufferStatusChanged {
        resource_id: Option<String>,
        old: String,
        new: String,
    },
    /// A seek finished, failed, or was cancelled.
    SeekCompleted {
        resource_id: Option<String>,
        target_ms: u64,
        finished: bool,
    },
    /// The coordinator tore everything down.
    Cleared,
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::ResourceAttached { .. } => "Resource attached",
            PlaybackEvent::StatusChanged { .. } => "Playback status changed",
            PlaybackEvent::BufferStatusChanged { .. } => "Buffer status changed",
            PlaybackEvent::SeekCompleted { .. } => "Seek completed",
            PlaybackEvent::Cleared => "Playback cleared",
        }
    }
}

// ============================================================================
// Autoplay Events
// ============================================================================

/// Mirror of autoplay decisions. Identities are rendered with `Debug`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum AutoplayEvent {
    /// A different candidate became the playing one.
    Switched {
        from: Option<String>,
        to: String,
    },
    /// Autoplay was suspended or resumed by the host.
    SuspensionChanged { suspended: bool },
    /// The current candidate was stopped and forgotten.
    Stopped { identity: String },
}

impl AutoplayEvent {
    fn description(&self) -> &str {
        match self {
            AutoplayEvent::Switched { .. } => "Autoplay switched candidate",
            AutoplayEvent::SuspensionChanged { .. } => "Autoplay suspension changed",
            AutoplayEvent::Stopped { .. } => "Autoplay stopped candidate",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Clone it freely; clones share the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus. Subscribers further than `capacity` events
    /// behind receive `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// if there are none.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A `broadcast::Receiver` with an optional filter.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let bus = EventBus::new(16);
/// let autoplay_only = EventStream::new(bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Autoplay(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` are returned by `recv`/`try_recv`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Returns `None` if no matching event is currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}
