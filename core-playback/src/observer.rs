//! Observer capability exposed by the playback coordinator.

use crate::resource::ResourceId;
use crate::status::{BufferStatus, Status};
use crate::time_observer::TimeEvent;

/// Receives coordinator notifications.
///
/// Every method is invoked on the coordinator task, in the order the
/// underlying engine signals were received, and never concurrently with
/// another notification from the same coordinator. Implementations should
/// return quickly; heavy work belongs on another task.
pub trait PlaybackObserver: Send + Sync {
    fn on_status(&self, _old: &Status, _new: &Status) {}

    fn on_buffer_status(&self, _old: BufferStatus, _new: BufferStatus) {}

    fn on_time_event(&self, _event: TimeEvent) {}

    /// A new resource was bound to the engine.
    fn on_resource_attached(&self, _resource: ResourceId) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PlaybackObserver for NoopObserver {}
