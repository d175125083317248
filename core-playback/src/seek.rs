//! # Seek Arbitration
//!
//! At most one seek is in flight. A seek requested while another is running
//! waits in a single queue slot; a newer request replaces a waiting one, and
//! the replaced request completes with
//! [`SeekFailureReason::Superseded`]. When the running seek completes, the
//! waiting one is issued. Every request completes exactly once.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, trace};

use crate::error::{PlaybackError, Result, SeekFailureReason};

/// Target and tolerances for a seek.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeekRequest {
    pub target: Duration,
    pub tolerance_before: Duration,
    pub tolerance_after: Duration,
}

impl SeekRequest {
    /// Seek to exactly `target`.
    pub fn exact(target: Duration) -> Self {
        Self {
            target,
            tolerance_before: Duration::ZERO,
            tolerance_after: Duration::ZERO,
        }
    }

    /// Let the engine land anywhere in `[target - before, target + after]`,
    /// typically on a nearby keyframe.
    pub fn with_tolerance(mut self, before: Duration, after: Duration) -> Self {
        self.tolerance_before = before;
        self.tolerance_after = after;
        self
    }

    pub fn is_exact(&self) -> bool {
        self.tolerance_before.is_zero() && self.tolerance_after.is_zero()
    }

    /// The same target with zero tolerance.
    pub fn to_exact(self) -> Self {
        Self::exact(self.target)
    }
}

/// Resolves once the seek it was returned for completes.
///
/// Dropping it does not cancel the seek.
#[derive(Debug)]
pub struct SeekCompletion {
    receiver: oneshot::Receiver<Result<()>>,
}

impl SeekCompletion {
    pub(crate) fn new(receiver: oneshot::Receiver<Result<()>>) -> Self {
        Self { receiver }
    }

    /// Completion that has already resolved with `result`.
    pub(crate) fn ready(result: Result<()>) -> Self {
        let (sender, receiver) = oneshot::channel();
        let _ = sender.send(result);
        Self { receiver }
    }
}

impl Future for SeekCompletion {
    type Output = Result<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(PlaybackError::CoordinatorClosed)))
    }
}

pub(crate) type SeekReply = Option<oneshot::Sender<Result<()>>>;

/// A seek request together with whoever waits for it. Internal seeks (the
/// played-to-end rewind) have no reply.
#[derive(Debug)]
pub(crate) struct PendingSeek {
    pub request: SeekRequest,
    reply: SeekReply,
}

impl PendingSeek {
    pub fn new(request: SeekRequest, reply: SeekReply) -> Self {
        Self { request, reply }
    }

    pub fn internal(request: SeekRequest) -> Self {
        Self {
            request,
            reply: None,
        }
    }

    pub fn complete(self, result: Result<()>) {
        if let Some(reply) = self.reply {
            // The caller may have dropped its completion.
            let _ = reply.send(result);
        }
    }
}

/// Result of reporting a finished engine seek.
#[derive(Debug)]
pub(crate) enum SeekOutcome {
    /// The ticket does not belong to the running seek (cancelled earlier).
    Stale,
    Completed {
        target: Duration,
        finished: bool,
        /// Queued request that should be issued now.
        next: Option<PendingSeek>,
    },
}

#[derive(Debug, Default)]
pub(crate) struct SeekArbiter {
    in_flight: Option<(u64, PendingSeek)>,
    queued: Option<PendingSeek>,
    next_ticket: u64,
}

impl SeekArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_seeking(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Park `seek` until the running one completes, superseding any request
    /// already waiting.
    pub fn enqueue(&mut self, seek: PendingSeek) {
        if let Some(replaced) = self.queued.replace(seek) {
            debug!(target_ms = replaced.request.target.as_millis() as u64, "Queued seek superseded");
            replaced.complete(Err(PlaybackError::SeekFailure(SeekFailureReason::Superseded)));
        }
    }

    /// Mark `seek` as running and return its ticket.
    pub fn begin(&mut self, seek: PendingSeek) -> u64 {
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.in_flight = Some((ticket, seek));
        ticket
    }

    /// Complete the running seek if `ticket` identifies it.
    pub fn finish(&mut self, ticket: u64, finished: bool) -> SeekOutcome {
        match self.in_flight.take() {
            Some((current, seek)) if current == ticket => {
                let target = seek.request.target;
                let result = if finished {
                    Ok(())
                } else {
                    Err(PlaybackError::SeekFailure(SeekFailureReason::NotFinished))
                };
                seek.complete(result);
                SeekOutcome::Completed {
                    target,
                    finished,
                    next: self.queued.take(),
                }
            }
            other => {
                trace!(ticket, "Ignoring completion of a cancelled seek");
                self.in_flight = other;
                SeekOutcome::Stale
            }
        }
    }

    /// Complete the running and the waiting seek with `Cancelled`.
    ///
    /// Returns how many requests were cancelled.
    pub fn cancel_all(&mut self) -> usize {
        let pending = self
            .in_flight
            .take()
            .map(|(_, seek)| seek)
            .into_iter()
            .chain(self.queued.take());

        let mut cancelled = 0;
        for seek in pending {
            seek.complete(Err(PlaybackError::SeekFailure(SeekFailureReason::Cancelled)));
            cancelled += 1;
        }
        cancelled
    }
}
