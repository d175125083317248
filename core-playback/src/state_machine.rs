//! # Playback State Machine
//!
//! Folds raw engine signals into the two observable axes, [`Status`] and
//! [`BufferStatus`], emitting a [`Transition`] only when a value actually
//! changes.
//!
//! ## Rules
//!
//! | Signal | Effect |
//! |--------|--------|
//! | engine status `Failed` | `Status::Failed` (engine) |
//! | engine status ready/unknown | ignored, readiness comes from the item |
//! | item status `ReadyToPlay` | `Status::ReadyToPlay` |
//! | item status `Failed` | `Status::Failed` (resource) |
//! | time control `Playing` / `Paused` | `Status::Playing` / `Status::Paused` |
//! | time control waiting, not likely to keep up | `BufferStatus::Buffering` |
//! | buffer empty | `BufferStatus::Buffering` |
//! | likely to keep up | `BufferStatus::ReadyToPlay` unless still `Unknown` |
//! | buffer full | `BufferStatus::Full` |
//! | played to end | `Status::PlayedToEnd` |
//! | failed to play to end | `Status::Failed` (resource) |
//!
//! Once failed, only another failure with a different description can change
//! state; everything else is ignored until [`reset`](PlaybackStateMachine::reset).

use bridge_traits::{EngineSignal, RawEngineStatus, RawItemStatus, RawTimeControl};
use tracing::{debug, warn};

use crate::status::{BufferStatus, PlaybackFailure, Status};

/// Old and new value of one axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange<T> {
    pub old: T,
    pub new: T,
}

/// A change on one of the two axes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Status(StateChange<Status>),
    Buffer(StateChange<BufferStatus>),
}

/// Deduplicating status/buffer state machine.
#[derive(Debug, Default)]
pub struct PlaybackStateMachine {
    status: Status,
    buffer_status: BufferStatus,
}

impl PlaybackStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn buffer_status(&self) -> BufferStatus {
        self.buffer_status
    }

    /// Fold one engine signal into the state.
    pub fn apply(&mut self, signal: &EngineSignal) -> Option<Transition> {
        match signal {
            EngineSignal::EngineStatusChanged(RawEngineStatus::Failed(info)) => {
                self.fail(PlaybackFailure::engine(info))
            }
            EngineSignal::EngineStatusChanged(_) => None,
            EngineSignal::ItemStatusChanged(RawItemStatus::ReadyToPlay) => {
                self.set_status(Status::ReadyToPlay)
            }
            EngineSignal::ItemStatusChanged(RawItemStatus::Failed(info)) => {
                self.fail(PlaybackFailure::resource(info))
            }
            EngineSignal::ItemStatusChanged(RawItemStatus::Unknown) => None,
            EngineSignal::TimeControlChanged {
                status,
                likely_to_keep_up,
            } => match status {
                RawTimeControl::Playing => self.set_status(Status::Playing),
                RawTimeControl::Paused => self.set_status(Status::Paused),
                RawTimeControl::WaitingToPlayAtRate if !likely_to_keep_up => {
                    self.set_buffer(BufferStatus::Buffering)
                }
                RawTimeControl::WaitingToPlayAtRate => None,
            },
            EngineSignal::PlaybackBufferEmpty => self.set_buffer(BufferStatus::Buffering),
            EngineSignal::PlaybackLikelyToKeepUp => {
                if self.buffer_status == BufferStatus::Unknown {
                    None
                } else {
                    self.set_buffer(BufferStatus::ReadyToPlay)
                }
            }
            EngineSignal::PlaybackBufferFull => self.set_buffer(BufferStatus::Full),
            EngineSignal::PlayedToEnd => self.set_status(Status::PlayedToEnd),
            EngineSignal::FailedToPlayToEnd(info) => self.fail(PlaybackFailure::resource(info)),
            EngineSignal::LoadedTimeRangesChanged(_) => None,
        }
    }

    /// Enter `Failed`. A failure equal to the current one is not re-emitted.
    pub fn fail(&mut self, failure: PlaybackFailure) -> Option<Transition> {
        let new = Status::Failed(failure);
        if self.status == new {
            return None;
        }
        warn!(status = %new, "Playback failed");
        Some(self.replace_status(new))
    }

    /// Return both axes to `Unknown`, reporting only the axes that changed.
    pub fn reset(&mut self) -> Vec<Transition> {
        let mut transitions = Vec::with_capacity(2);
        if self.status != Status::Unknown {
            transitions.push(self.replace_status(Status::Unknown));
        }
        if self.buffer_status != BufferStatus::Unknown {
            transitions.push(self.replace_buffer(BufferStatus::Unknown));
        }
        transitions
    }

    fn set_status(&mut self, new: Status) -> Option<Transition> {
        if self.status.is_failed() || self.status == new {
            return None;
        }
        Some(self.replace_status(new))
    }

    fn set_buffer(&mut self, new: BufferStatus) -> Option<Transition> {
        if self.status.is_failed() || self.buffer_status == new {
            return None;
        }
        Some(self.replace_buffer(new))
    }

    fn replace_status(&mut self, new: Status) -> Transition {
        let old = std::mem::replace(&mut self.status, new.clone());
        debug!(old = %old, new = %new, "Status transition");
        Transition::Status(StateChange { old, new })
    }

    fn replace_buffer(&mut self, new: BufferStatus) -> Transition {
        let old = std::mem::replace(&mut self.buffer_status, new);
        debug!(old = %old, new = %new, "Buffer status transition");
        Transition::Buffer(StateChange { old, new })
    }
}
