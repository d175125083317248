//! # Engine Exclusivity Registry
//!
//! Makes sure no two coordinators observe the same engine instance. The
//! registry is an ordinary value: create one per process (or per test) and
//! pass it to every coordinator builder that should respect it.

use bridge_traits::MediaEngine;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{PlaybackError, Result};

/// Set of engine instances currently owned by a coordinator.
#[derive(Debug, Clone, Default)]
pub struct EngineRegistry {
    claimed: Arc<Mutex<HashSet<usize>>>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim exclusive use of `engine`.
    ///
    /// The claim lasts until the returned [`EngineClaim`] is dropped.
    pub fn claim(&self, engine: &Arc<dyn MediaEngine>) -> Result<EngineClaim> {
        let key = engine_key(engine);
        let mut claimed = self.claimed.lock();
        if !claimed.insert(key) {
            warn!("Engine already owned by another coordinator");
            return Err(PlaybackError::EngineInUse);
        }
        debug!(owned = claimed.len(), "Engine claimed");
        Ok(EngineClaim {
            key,
            claimed: Arc::clone(&self.claimed),
        })
    }

    pub fn is_claimed(&self, engine: &Arc<dyn MediaEngine>) -> bool {
        self.claimed.lock().contains(&engine_key(engine))
    }

    /// Number of engines currently owned.
    pub fn len(&self) -> usize {
        self.claimed.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Exclusive ownership of one engine; released on drop.
#[derive(Debug)]
pub struct EngineClaim {
    key: usize,
    claimed: Arc<Mutex<HashSet<usize>>>,
}

impl Drop for EngineClaim {
    fn drop(&mut self) {
        self.claimed.lock().remove(&self.key);
        debug!("Engine released");
    }
}

/// Identity of an engine instance: the address of its shared allocation.
fn engine_key(engine: &Arc<dyn MediaEngine>) -> usize {
    Arc::as_ptr(engine) as *const () as usize
}
