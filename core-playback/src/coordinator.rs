//! # Playback Coordinator
//!
//! The object callers interact with. It wraps one [`MediaEngine`] and turns
//! its unordered callbacks into a clean status stream.
//!
//! ## Architecture
//!
//! ```text
//!  caller ──play/pause/seek/attach──┐
//!                                    ▼
//!  engine callbacks ──(generation)──► mpsc ──► coordinator task ──► observer
//!                                                │                  event bus
//!                                                └──► watch snapshot ──► accessors
//! ```
//!
//! [`PlaybackCoordinator`] is a cheap handle. All state lives in a single
//! spawned task that processes commands one at a time, so state mutation and
//! observer callbacks never run concurrently. Engine callbacks are stamped
//! with the attach generation they were registered under; anything from an
//! older generation is dropped, which keeps a torn-down resource from leaking
//! events into its successor.

use bridge_traits::{
    BridgeError, EngineSignal, MediaEngine, ObserverToken, TimeCallback,
};
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};

use crate::config::{validate_rate, PlaybackConfig};
use crate::error::{PlaybackError, Result};
use crate::observer::PlaybackObserver;
use crate::registry::{EngineClaim, EngineRegistry};
use crate::resource::{PlayableResource, ResourceId};
use crate::seek::{PendingSeek, SeekArbiter, SeekCompletion, SeekOutcome, SeekRequest};
use crate::state_machine::{PlaybackStateMachine, Transition};
use crate::status::{BufferStatus, FailureKind, PlaybackFailure, Status};
use crate::time_observer::{TimeEvent, TimeObservationRegistry, TimeSubscriptionKind};
use crate::timing::{buffered_until, duration_from_secs, position_from_secs, progress};

// ============================================================================
// Snapshot
// ============================================================================

/// State published by the coordinator task after every command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackSnapshot {
    pub status: Status,
    pub buffer_status: BufferStatus,
    pub resource: Option<ResourceId>,
    pub is_seeking: bool,
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`PlaybackCoordinator`].
#[derive(Default)]
pub struct PlaybackCoordinatorBuilder {
    engine: Option<Arc<dyn MediaEngine>>,
    config: PlaybackConfig,
    observer: Option<Arc<dyn PlaybackObserver>>,
    event_bus: Option<EventBus>,
    registry: Option<EngineRegistry>,
}

impl PlaybackCoordinatorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine to drive (required).
    pub fn engine(mut self, engine: Arc<dyn MediaEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn config(mut self, config: PlaybackConfig) -> Self {
        self.config = config;
        self
    }

    pub fn observer(mut self, observer: Arc<dyn PlaybackObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Mirror notifications onto `event_bus`.
    pub fn event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Claim the engine in `registry` so no other coordinator can use it.
    pub fn registry(mut self, registry: EngineRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Validate the setup and spawn the coordinator task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> Result<PlaybackCoordinator> {
        let engine = self
            .engine
            .ok_or_else(|| PlaybackError::CapabilityMissing {
                capability: "MediaEngine".to_string(),
                message: "a media engine is required to build a playback coordinator"
                    .to_string(),
            })?;
        self.config.validate()?;

        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            PlaybackError::CapabilityMissing {
                capability: "tokio runtime".to_string(),
                message: e.to_string(),
            }
        })?;

        let claim = match &self.registry {
            Some(registry) => Some(registry.claim(&engine)?),
            None => None,
        };

        let (commands, receiver) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(PlaybackSnapshot::default());

        let mut time = TimeObservationRegistry::new();
        let callbacks = time_callbacks(commands.clone(), 0);
        time.set_periodic(self.config.periodic_interval, engine.as_ref(), &callbacks)?;

        let task = CoordinatorTask {
            engine: Arc::clone(&engine),
            config: self.config.clone(),
            observer: self.observer,
            event_bus: self.event_bus,
            sender: commands.clone(),
            snapshot: snapshot_tx,
            machine: PlaybackStateMachine::new(),
            time,
            seeks: SeekArbiter::new(),
            resource: None,
            signal_token: None,
            load_cancel: None,
            generation: 0,
            _claim: claim,
        };
        runtime.spawn(task.run(receiver));

        debug!("Playback coordinator started");
        Ok(PlaybackCoordinator {
            inner: Arc::new(Inner {
                commands,
                snapshot: snapshot_rx,
                engine,
                config: self.config,
            }),
        })
    }
}

// ============================================================================
// Handle
// ============================================================================

/// Handle to a playback coordinator.
///
/// Clones share the same coordinator. When the last clone is dropped the
/// coordinator tears down the attached resource and stops.
#[derive(Clone)]
pub struct PlaybackCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    commands: mpsc::UnboundedSender<Command>,
    snapshot: watch::Receiver<PlaybackSnapshot>,
    engine: Arc<dyn MediaEngine>,
    config: PlaybackConfig,
}

impl Drop for Inner {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
    }
}

impl PlaybackCoordinator {
    pub fn builder() -> PlaybackCoordinatorBuilder {
        PlaybackCoordinatorBuilder::new()
    }

    /// Coordinator with default configuration and no observer.
    pub fn new(engine: Arc<dyn MediaEngine>) -> Result<Self> {
        Self::builder().engine(engine).build()
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.inner.config
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    /// Replace the current resource with `resource`.
    ///
    /// Everything bound to the previous resource is torn down before the new
    /// one is loaded. `Status` moves to `ReadyToPlay` only once the engine
    /// reports the item ready.
    pub fn attach(&self, resource: PlayableResource) -> Result<()> {
        self.send(Command::Attach(resource))
    }

    /// Start playback at `rate`. Ignored when nothing is attached.
    ///
    /// The resulting `Playing` status arrives asynchronously.
    pub fn play(&self, rate: f32) -> Result<()> {
        validate_rate(rate)?;
        self.send(Command::Play(rate))
    }

    /// Pause playback. Ignored when nothing is attached.
    pub fn pause(&self) -> Result<()> {
        self.send(Command::Pause)
    }

    /// Seek exactly to `target`.
    pub fn seek(&self, target: Duration) -> SeekCompletion {
        self.seek_with(SeekRequest::exact(target))
    }

    /// Seek with explicit tolerances.
    ///
    /// The returned completion resolves exactly once: `Ok` when the engine
    /// finished the seek, `SeekFailure` when it did not, was cancelled by
    /// `clear`/`attach`, or was superseded by a newer request, and
    /// `NoResource` when nothing is attached.
    pub fn seek_with(&self, request: SeekRequest) -> SeekCompletion {
        let (reply, receiver) = oneshot::channel();
        match self.send(Command::Seek {
            request,
            reply: Some(reply),
        }) {
            Ok(()) => SeekCompletion::new(receiver),
            Err(e) => SeekCompletion::ready(Err(e)),
        }
    }

    /// Replace the periodic time subscription; `None` removes it.
    pub fn set_periodic_time(&self, interval: Option<Duration>) -> Result<()> {
        if interval == Some(Duration::ZERO) {
            return Err(PlaybackError::InvalidConfig(
                "periodic interval must be > 0".to_string(),
            ));
        }
        self.send(Command::SetPeriodic(interval))
    }

    /// Replace the boundary time subscription; an empty set removes it.
    pub fn set_boundary_times<I>(&self, times: I) -> Result<()>
    where
        I: IntoIterator<Item = Duration>,
    {
        self.send(Command::SetBoundary(times.into_iter().collect()))
    }

    /// Tear down the current resource and reset both statuses to `Unknown`.
    ///
    /// Pending loads and seeks are cancelled; seek completions fire with
    /// `SeekFailure(Cancelled)`. Calling it again is a no-op.
    pub async fn clear(&self) -> Result<()> {
        let (done, wait) = oneshot::channel();
        self.send(Command::Clear(done))?;
        wait.await.map_err(|_| PlaybackError::CoordinatorClosed)
    }

    /// Resolves once every command sent before it has been processed.
    ///
    /// Work the engine completes later (loads, seeks) is not awaited.
    pub async fn settle(&self) -> Result<()> {
        let (done, wait) = oneshot::channel();
        self.send(Command::Settle(done))?;
        wait.await.map_err(|_| PlaybackError::CoordinatorClosed)
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn status(&self) -> Status {
        self.inner.snapshot.borrow().status.clone()
    }

    pub fn buffer_status(&self) -> BufferStatus {
        self.inner.snapshot.borrow().buffer_status
    }

    pub fn is_seeking(&self) -> bool {
        self.inner.snapshot.borrow().is_seeking
    }

    pub fn resource_id(&self) -> Option<ResourceId> {
        self.inner.snapshot.borrow().resource
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.inner.snapshot.borrow().clone()
    }

    /// Receiver that is notified whenever the snapshot changes.
    pub fn watch(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.inner.snapshot.clone()
    }

    /// Current position; zero when nothing is attached.
    pub fn current_time(&self) -> Duration {
        if self.resource_id().is_none() {
            return Duration::ZERO;
        }
        position_from_secs(self.inner.engine.current_time())
    }

    /// Duration of the attached item, `None` while unknown or unbounded.
    pub fn duration(&self) -> Option<Duration> {
        self.resource_id()?;
        duration_from_secs(self.inner.engine.duration())
    }

    /// `current_time / duration`, `0.0` when the duration is not positive.
    pub fn progress(&self) -> f64 {
        progress(self.current_time(), self.duration())
    }

    fn send(&self, command: Command) -> Result<()> {
        self.inner
            .commands
            .send(command)
            .map_err(|_| PlaybackError::CoordinatorClosed)
    }
}

impl fmt::Debug for PlaybackCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackCoordinator")
            .field("snapshot", &*self.inner.snapshot.borrow())
            .finish()
    }
}

// ============================================================================
// Coordinator task
// ============================================================================

enum Command {
    Attach(PlayableResource),
    Play(f32),
    Pause,
    Seek {
        request: SeekRequest,
        reply: Option<oneshot::Sender<Result<()>>>,
    },
    SeekFinished {
        generation: u64,
        ticket: u64,
        finished: bool,
    },
    SetPeriodic(Option<Duration>),
    SetBoundary(BTreeSet<Duration>),
    Clear(oneshot::Sender<()>),
    Settle(oneshot::Sender<()>),
    Signal {
        generation: u64,
        signal: EngineSignal,
    },
    Time {
        generation: u64,
        kind: TimeSubscriptionKind,
        seconds: f64,
    },
    LoadFinished {
        generation: u64,
        result: bridge_traits::error::Result<()>,
    },
    Shutdown,
}

struct CoordinatorTask {
    engine: Arc<dyn MediaEngine>,
    config: PlaybackConfig,
    observer: Option<Arc<dyn PlaybackObserver>>,
    event_bus: Option<EventBus>,
    sender: mpsc::UnboundedSender<Command>,
    snapshot: watch::Sender<PlaybackSnapshot>,
    machine: PlaybackStateMachine,
    time: TimeObservationRegistry,
    seeks: SeekArbiter,
    resource: Option<PlayableResource>,
    signal_token: Option<ObserverToken>,
    load_cancel: Option<CancellationToken>,
    generation: u64,
    _claim: Option<EngineClaim>,
}

impl CoordinatorTask {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = commands.recv().await {
            if let Command::Shutdown = command {
                break;
            }
            self.handle(command);
            self.publish();
        }

        self.teardown();
        debug!("Playback coordinator stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Attach(resource) => self.attach(resource),
            Command::Play(rate) => self.play(rate),
            Command::Pause => self.pause(),
            Command::Seek { request, reply } => self.seek(PendingSeek::new(request, reply)),
            Command::SeekFinished {
                generation,
                ticket,
                finished,
            } => self.seek_finished(generation, ticket, finished),
            Command::SetPeriodic(interval) => {
                let callbacks = time_callbacks(self.sender.clone(), self.generation);
                if let Err(e) =
                    self.time
                        .set_periodic(interval, self.engine.as_ref(), &callbacks)
                {
                    warn!(error = %e, "Rejected periodic time subscription");
                }
            }
            Command::SetBoundary(times) => {
                let callbacks = time_callbacks(self.sender.clone(), self.generation);
                self.time.set_boundary(times, self.engine.as_ref(), &callbacks);
            }
            Command::Clear(done) => {
                self.clear();
                let _ = done.send(());
            }
            Command::Settle(done) => {
                let _ = done.send(());
            }
            Command::Signal { generation, signal } => {
                if self.is_current(generation) {
                    self.signal(signal);
                } else {
                    trace!(signal = signal.name(), generation, "Dropping stale engine signal");
                }
            }
            Command::Time {
                generation,
                kind,
                seconds,
            } => {
                if self.is_current(generation) {
                    self.time_fired(kind, seconds);
                } else {
                    trace!(?kind, generation, "Dropping stale time callback");
                }
            }
            Command::LoadFinished { generation, result } => {
                if self.is_current(generation) {
                    self.load_finished(result);
                }
            }
            Command::Shutdown => {}
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        generation == self.generation && self.resource.is_some()
    }

    // ------------------------------------------------------------------------
    // Resource lifecycle
    // ------------------------------------------------------------------------

    #[instrument(level = "debug", skip(self, resource), fields(resource_id = %resource.id()))]
    fn attach(&mut self, resource: PlayableResource) {
        self.teardown();
        self.generation += 1;

        let generation = self.generation;
        let sender = self.sender.clone();
        let token = self.engine.add_signal_observer(Arc::new(move |signal| {
            let _ = sender.send(Command::Signal { generation, signal });
        }));
        self.signal_token = Some(token);

        let callbacks = time_callbacks(self.sender.clone(), generation);
        self.time.arm(self.engine.as_ref(), &callbacks);

        info!(
            locator = %resource.redacted_locator(),
            generation,
            "Attaching resource"
        );
        if let Some(observer) = &self.observer {
            observer.on_resource_attached(resource.id());
        }
        self.emit(PlaybackEvent::ResourceAttached {
            resource_id: resource.id().to_string(),
            locator: resource.redacted_locator(),
        });

        self.start_load(&resource, generation);
        self.resource = Some(resource);
    }

    fn start_load(&mut self, resource: &PlayableResource, generation: u64) {
        let cancel = CancellationToken::new();
        self.load_cancel = Some(cancel.clone());

        let engine = Arc::clone(&self.engine);
        let sender = self.sender.clone();
        let source = resource.source().clone();
        tokio::spawn(async move {
            let result = tokio::select! {
                _ = cancel.cancelled() => Err(BridgeError::Cancelled),
                result = engine.load(&source) => result,
            };
            let _ = sender.send(Command::LoadFinished { generation, result });
        });
    }

    fn load_finished(&mut self, result: bridge_traits::error::Result<()>) {
        self.load_cancel = None;
        match result {
            Ok(()) => debug!("Resource loaded"),
            Err(BridgeError::Cancelled) => debug!("Resource load cancelled"),
            Err(e) => {
                let failure = PlaybackFailure {
                    kind: FailureKind::Resource,
                    message: e.to_string(),
                    code: None,
                };
                if let Some(transition) = self.machine.fail(failure) {
                    self.dispatch(transition);
                }
            }
        }
    }

    #[instrument(level = "debug", skip(self))]
    fn clear(&mut self) {
        let had_resource = self.teardown();
        self.generation += 1;
        if had_resource {
            info!("Playback cleared");
            self.emit(PlaybackEvent::Cleared);
        }
    }

    /// Unbind the current resource, strictly in this order: cancel loading,
    /// cancel seeks, remove time observers, remove the signal observer,
    /// release the item. Both statuses then return to `Unknown`.
    ///
    /// Returns whether a resource was attached.
    fn teardown(&mut self) -> bool {
        let had_resource = self.resource.take().is_some();

        if let Some(cancel) = self.load_cancel.take() {
            cancel.cancel();
            self.engine.cancel_loading();
        }

        if self.seeks.is_seeking() {
            self.engine.cancel_pending_seeks();
        }
        let cancelled = self.seeks.cancel_all();
        if cancelled > 0 {
            debug!(cancelled, "Cancelled pending seeks");
        }

        self.time.disarm(self.engine.as_ref());

        if let Some(token) = self.signal_token.take() {
            self.engine.remove_observer(token);
        }

        if had_resource {
            self.engine.unload();
        }

        for transition in self.machine.reset() {
            self.dispatch(transition);
        }
        had_resource
    }

    // ------------------------------------------------------------------------
    // Playback control
    // ------------------------------------------------------------------------

    fn play(&mut self, rate: f32) {
        if self.resource.is_none() {
            debug!("Ignoring play: no resource attached");
            return;
        }
        debug!(rate, "Play");
        self.engine.set_rate(rate);
    }

    fn pause(&mut self) {
        if self.resource.is_none() {
            debug!("Ignoring pause: no resource attached");
            return;
        }
        debug!("Pause");
        self.engine.pause();
    }

    fn seek(&mut self, seek: PendingSeek) {
        if self.resource.is_none() {
            debug!("Rejecting seek: no resource attached");
            seek.complete(Err(PlaybackError::NoResource));
            return;
        }
        if self.seeks.is_seeking() {
            debug!(target_ms = seek.request.target.as_millis() as u64, "Queueing seek");
            self.seeks.enqueue(seek);
            return;
        }
        self.start_seek(seek);
    }

    fn start_seek(&mut self, mut seek: PendingSeek) {
        if self.machine.status().is_playing() {
            self.engine.pause();
            seek.request = seek.request.to_exact();
        }

        let request = seek.request;
        let ticket = self.seeks.begin(seek);
        debug!(target_ms = request.target.as_millis() as u64, ticket, "Seeking");

        let engine = Arc::clone(&self.engine);
        let sender = self.sender.clone();
        let generation = self.generation;
        tokio::spawn(async move {
            let finished = engine
                .seek(
                    request.target,
                    request.tolerance_before,
                    request.tolerance_after,
                )
                .await;
            let _ = sender.send(Command::SeekFinished {
                generation,
                ticket,
                finished,
            });
        });
    }

    fn seek_finished(&mut self, generation: u64, ticket: u64, finished: bool) {
        if generation != self.generation {
            trace!(ticket, "Dropping seek completion from a previous resource");
            return;
        }
        match self.seeks.finish(ticket, finished) {
            SeekOutcome::Stale => {}
            SeekOutcome::Completed {
                target,
                finished,
                next,
            } => {
                if !finished {
                    warn!(target_ms = target.as_millis() as u64, "Seek did not finish");
                }
                self.emit(PlaybackEvent::SeekCompleted {
                    resource_id: self.resource.as_ref().map(|r| r.id().to_string()),
                    target_ms: target.as_millis() as u64,
                    finished,
                });
                if let Some(next) = next {
                    self.start_seek(next);
                }
            }
        }
    }

    // ------------------------------------------------------------------------
    // Engine callbacks
    // ------------------------------------------------------------------------

    fn signal(&mut self, signal: EngineSignal) {
        if let EngineSignal::LoadedTimeRangesChanged(ranges) = &signal {
            if self.config.emit_buffer_events {
                if let Some(until) = buffered_until(ranges) {
                    self.notify_time(TimeEvent::Buffer(until, self.duration()));
                }
            }
            return;
        }

        let played_to_end = matches!(signal, EngineSignal::PlayedToEnd);
        if let Some(transition) = self.machine.apply(&signal) {
            self.dispatch(transition);
            if played_to_end {
                self.rewind();
            }
        }
    }

    fn rewind(&mut self) {
        if !self.config.rewind_on_end {
            return;
        }
        if self.seeks.is_seeking() {
            debug!("Not rewinding: a requested seek is pending");
            return;
        }
        match self.duration() {
            Some(duration) if !duration.is_zero() => {
                debug!("Rewinding to start after reaching the end");
                self.seek(PendingSeek::internal(SeekRequest::exact(Duration::ZERO)));
            }
            _ => {}
        }
    }

    fn time_fired(&mut self, kind: TimeSubscriptionKind, seconds: f64) {
        let time = position_from_secs(seconds);
        let duration = self.duration();
        let event = match kind {
            TimeSubscriptionKind::Periodic => TimeEvent::Periodic(time, duration),
            TimeSubscriptionKind::Boundary => TimeEvent::Boundary(time, duration),
        };
        self.notify_time(event);
    }

    fn duration(&self) -> Option<Duration> {
        duration_from_secs(self.engine.duration())
    }

    // ------------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------------

    fn dispatch(&self, transition: Transition) {
        let resource_id = self.resource.as_ref().map(|r| r.id().to_string());
        match transition {
            Transition::Status(change) => {
                if let Some(observer) = &self.observer {
                    observer.on_status(&change.old, &change.new);
                }
                self.emit(PlaybackEvent::StatusChanged {
                    resource_id,
                    old: change.old.to_string(),
                    new: change.new.to_string(),
                });
            }
            Transition::Buffer(change) => {
                if let Some(observer) = &self.observer {
                    observer.on_buffer_status(change.old, change.new);
                }
                self.emit(PlaybackEvent::BufferStatusChanged {
                    resource_id,
                    old: change.old.to_string(),
                    new: change.new.to_string(),
                });
            }
        }
    }

    fn notify_time(&self, event: TimeEvent) {
        if let Some(observer) = &self.observer {
            observer.on_time_event(event);
        }
    }

    fn emit(&self, event: PlaybackEvent) {
        if let Some(bus) = &self.event_bus {
            // No subscribers is fine.
            let _ = bus.emit(CoreEvent::Playback(event));
        }
    }

    fn publish(&self) {
        let snapshot = PlaybackSnapshot {
            status: self.machine.status().clone(),
            buffer_status: self.machine.buffer_status(),
            resource: self.resource.as_ref().map(PlayableResource::id),
            is_seeking: self.seeks.is_seeking(),
        };
        self.snapshot.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}

/// Engine time callbacks that forward into the coordinator task.
fn time_callbacks(
    sender: mpsc::UnboundedSender<Command>,
    generation: u64,
) -> impl Fn(TimeSubscriptionKind) -> TimeCallback {
    move |kind| -> TimeCallback {
        let sender = sender.clone();
        Arc::new(move |seconds| {
            let _ = sender.send(Command::Time {
                generation,
                kind,
                seconds,
            });
        })
    }
}
