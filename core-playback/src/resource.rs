//! Playable resource identity.

use bridge_traits::MediaSource;
use core_runtime::logging::redact_locator;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier of one attached resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceId(Uuid);

impl ResourceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ResourceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One playable item.
///
/// Identity and source are fixed at construction; a new item means a new
/// `PlayableResource`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayableResource {
    id: ResourceId,
    source: MediaSource,
}

impl PlayableResource {
    pub fn new(source: MediaSource) -> Self {
        Self {
            id: ResourceId::new(),
            source,
        }
    }

    /// Resource with a caller-chosen id (e.g. a feed row's stable id).
    pub fn with_id(id: ResourceId, source: MediaSource) -> Self {
        Self { id, source }
    }

    /// Shorthand for a remote stream without extra headers.
    pub fn remote(url: impl Into<String>) -> Self {
        Self::new(MediaSource::remote(url))
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn source(&self) -> &MediaSource {
        &self.source
    }

    /// Locator safe to write to logs.
    pub fn redacted_locator(&self) -> String {
        redact_locator(&self.source.locator())
    }
}
