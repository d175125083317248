//! In-memory engine and recording observer shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::{
    EngineSignal, MediaEngine, MediaSource, ObserverToken, SignalCallback, TimeCallback,
    TimeRange,
};
use core_playback::{BufferStatus, PlaybackObserver, ResourceId, Status, TimeEvent};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Notify};

// ============================================================================
// Fake engine
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IssuedSeek {
    pub position: Duration,
    pub tolerance_before: Duration,
    pub tolerance_after: Duration,
}

#[derive(Default)]
struct EngineState {
    next_token: u64,
    signal_observers: HashMap<u64, SignalCallback>,
    periodic_observers: HashMap<u64, (Duration, TimeCallback)>,
    boundary_observers: HashMap<u64, (Vec<Duration>, TimeCallback)>,
    /// Every callback ever registered, including removed ones.
    all_signal_callbacks: Vec<SignalCallback>,
    all_time_callbacks: Vec<TimeCallback>,
    pending_seeks: Vec<oneshot::Sender<bool>>,
    issued_seeks: Vec<IssuedSeek>,
    max_concurrent_seeks: usize,
    calls: Vec<String>,
    rate: f32,
    current_time: f64,
    duration: f64,
    hold_loads: bool,
    load_error: Option<String>,
}

/// Scriptable engine: callbacks fire only when a test asks, seeks stay pending
/// until completed, loads resolve immediately unless held.
pub struct FakeEngine {
    state: Mutex<EngineState>,
    load_release: Notify,
}

impl FakeEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(EngineState {
                duration: f64::NAN,
                ..Default::default()
            }),
            load_release: Notify::new(),
        })
    }

    /// Keep `load` pending until cancelled.
    pub fn hold_loads(&self) {
        self.state.lock().hold_loads = true;
    }

    pub fn fail_loads(&self, message: &str) {
        self.state.lock().load_error = Some(message.to_string());
    }

    pub fn set_times(&self, current: f64, duration: f64) {
        let mut state = self.state.lock();
        state.current_time = current;
        state.duration = duration;
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Index of the first call starting with `prefix`.
    pub fn call_index(&self, prefix: &str) -> Option<usize> {
        self.calls().iter().position(|call| call.starts_with(prefix))
    }

    pub fn signal_observer_count(&self) -> usize {
        self.state.lock().signal_observers.len()
    }

    pub fn time_observer_count(&self) -> usize {
        let state = self.state.lock();
        state.periodic_observers.len() + state.boundary_observers.len()
    }

    pub fn periodic_intervals(&self) -> Vec<Duration> {
        self.state
            .lock()
            .periodic_observers
            .values()
            .map(|(interval, _)| *interval)
            .collect()
    }

    /// Deliver `signal` to every registered signal observer.
    pub fn emit(&self, signal: EngineSignal) {
        let callbacks: Vec<SignalCallback> =
            self.state.lock().signal_observers.values().cloned().collect();
        for callback in callbacks {
            callback(signal.clone());
        }
    }

    /// Deliver `signal` to every signal callback ever registered, including
    /// removed ones, like an engine that keeps firing after unregistration.
    pub fn emit_to_all_ever_registered(&self, signal: EngineSignal) {
        let callbacks = self.state.lock().all_signal_callbacks.clone();
        for callback in callbacks {
            callback(signal.clone());
        }
    }

    pub fn fire_periodic(&self, seconds: f64) {
        let callbacks: Vec<TimeCallback> = self
            .state
            .lock()
            .periodic_observers
            .values()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for callback in callbacks {
            callback(seconds);
        }
    }

    pub fn fire_boundary(&self, seconds: f64) {
        let callbacks: Vec<TimeCallback> = self
            .state
            .lock()
            .boundary_observers
            .values()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for callback in callbacks {
            callback(seconds);
        }
    }

    pub fn fire_all_time_callbacks_ever_registered(&self, seconds: f64) {
        let callbacks = self.state.lock().all_time_callbacks.clone();
        for callback in callbacks {
            callback(seconds);
        }
    }

    pub fn pending_seek_count(&self) -> usize {
        self.state.lock().pending_seeks.len()
    }

    pub fn issued_seeks(&self) -> Vec<IssuedSeek> {
        self.state.lock().issued_seeks.clone()
    }

    pub fn max_concurrent_seeks(&self) -> usize {
        self.state.lock().max_concurrent_seeks
    }

    /// Resolve the oldest pending seek.
    pub fn complete_seek(&self, finished: bool) {
        let sender = {
            let mut state = self.state.lock();
            if state.pending_seeks.is_empty() {
                None
            } else {
                Some(state.pending_seeks.remove(0))
            }
        };
        if let Some(sender) = sender {
            let _ = sender.send(finished);
        }
    }

    fn record(&self, call: impl Into<String>) {
        self.state.lock().calls.push(call.into());
    }

    fn register(&self) -> ObserverToken {
        let mut state = self.state.lock();
        state.next_token += 1;
        ObserverToken::new(state.next_token)
    }
}

#[async_trait]
impl MediaEngine for FakeEngine {
    async fn load(&self, source: &MediaSource) -> BridgeResult<()> {
        self.record(format!("load:{}", source.locator()));
        let (hold, error) = {
            let state = self.state.lock();
            (state.hold_loads, state.load_error.clone())
        };
        if let Some(message) = error {
            return Err(BridgeError::LoadFailed(message));
        }
        if hold {
            self.load_release.notified().await;
        }
        Ok(())
    }

    fn cancel_loading(&self) {
        self.record("cancel_loading");
    }

    fn unload(&self) {
        self.record("unload");
    }

    fn set_rate(&self, rate: f32) {
        self.record(format!("set_rate:{}", rate));
        self.state.lock().rate = rate;
    }

    fn pause(&self) {
        self.record("pause");
        self.state.lock().rate = 0.0;
    }

    fn rate(&self) -> f32 {
        self.state.lock().rate
    }

    async fn seek(
        &self,
        position: Duration,
        tolerance_before: Duration,
        tolerance_after: Duration,
    ) -> bool {
        let (sender, receiver) = oneshot::channel();
        {
            let mut state = self.state.lock();
            state.calls.push(format!("seek:{}", position.as_millis()));
            state.issued_seeks.push(IssuedSeek {
                position,
                tolerance_before,
                tolerance_after,
            });
            state.pending_seeks.push(sender);
            state.max_concurrent_seeks = state.max_concurrent_seeks.max(state.pending_seeks.len());
        }
        // Dropped sender means the seek was cancelled.
        receiver.await.unwrap_or(false)
    }

    fn cancel_pending_seeks(&self) {
        let mut state = self.state.lock();
        state.calls.push("cancel_pending_seeks".to_string());
        state.pending_seeks.clear();
    }

    fn current_time(&self) -> f64 {
        self.state.lock().current_time
    }

    fn duration(&self) -> f64 {
        self.state.lock().duration
    }

    fn loaded_time_ranges(&self) -> Vec<TimeRange> {
        Vec::new()
    }

    fn add_signal_observer(&self, callback: SignalCallback) -> ObserverToken {
        let token = self.register();
        let mut state = self.state.lock();
        state.calls.push(format!("add_signal_observer:{}", token.raw()));
        state.all_signal_callbacks.push(Arc::clone(&callback));
        state.signal_observers.insert(token.raw(), callback);
        token
    }

    fn add_periodic_time_observer(
        &self,
        interval: Duration,
        callback: TimeCallback,
    ) -> ObserverToken {
        let token = self.register();
        let mut state = self.state.lock();
        state.calls.push(format!("add_periodic_time_observer:{}", token.raw()));
        state.all_time_callbacks.push(Arc::clone(&callback));
        state.periodic_observers.insert(token.raw(), (interval, callback));
        token
    }

    fn add_boundary_time_observer(
        &self,
        times: Vec<Duration>,
        callback: TimeCallback,
    ) -> ObserverToken {
        let token = self.register();
        let mut state = self.state.lock();
        state.calls.push(format!("add_boundary_time_observer:{}", token.raw()));
        state.all_time_callbacks.push(Arc::clone(&callback));
        state.boundary_observers.insert(token.raw(), (times, callback));
        token
    }

    fn remove_observer(&self, token: ObserverToken) {
        let mut state = self.state.lock();
        let kind = if state.signal_observers.remove(&token.raw()).is_some() {
            "signal"
        } else if state.periodic_observers.remove(&token.raw()).is_some() {
            "periodic"
        } else if state.boundary_observers.remove(&token.raw()).is_some() {
            "boundary"
        } else {
            "unknown"
        };
        state.calls.push(format!("remove_observer:{}:{}", kind, token.raw()));
    }
}

// ============================================================================
// Recording observer
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Note {
    Status(Status, Status),
    Buffer(BufferStatus, BufferStatus),
    Time(TimeEvent),
    Attached(ResourceId),
}

#[derive(Default)]
pub struct RecordingObserver {
    notes: Mutex<Vec<Note>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn notes(&self) -> Vec<Note> {
        self.notes.lock().clone()
    }

    pub fn statuses(&self) -> Vec<(Status, Status)> {
        self.notes()
            .into_iter()
            .filter_map(|note| match note {
                Note::Status(old, new) => Some((old, new)),
                _ => None,
            })
            .collect()
    }

    pub fn buffers(&self) -> Vec<(BufferStatus, BufferStatus)> {
        self.notes()
            .into_iter()
            .filter_map(|note| match note {
                Note::Buffer(old, new) => Some((old, new)),
                _ => None,
            })
            .collect()
    }

    pub fn time_events(&self) -> Vec<TimeEvent> {
        self.notes()
            .into_iter()
            .filter_map(|note| match note {
                Note::Time(event) => Some(event),
                _ => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.notes.lock().len()
    }
}

impl PlaybackObserver for RecordingObserver {
    fn on_status(&self, old: &Status, new: &Status) {
        self.notes.lock().push(Note::Status(old.clone(), new.clone()));
    }

    fn on_buffer_status(&self, old: BufferStatus, new: BufferStatus) {
        self.notes.lock().push(Note::Buffer(old, new));
    }

    fn on_time_event(&self, event: TimeEvent) {
        self.notes.lock().push(Note::Time(event));
    }

    fn on_resource_attached(&self, resource: ResourceId) {
        self.notes.lock().push(Note::Attached(resource));
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Poll `condition` while letting spawned tasks run; panics after one second.
pub async fn eventually<F>(mut condition: F)
where
    F: FnMut() -> bool,
{
    for _ in 0..1000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("condition not reached within 1s");
}

/// Await `future` with a one second timeout.
pub async fn within<F: Future>(future: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(1), future)
        .await
        .expect("future did not resolve within 1s")
}
