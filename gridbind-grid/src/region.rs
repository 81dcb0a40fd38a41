//! Named replicated regions: shared key/value entries plus per-view,
//! per-partition delivery queues.

use crate::grid::GridShared;
use crate::queue::GridQueue;
use bytes::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use gridbind_core::{PartitionId, Result};
use std::fmt;
use std::sync::Arc;

/// Shared state of one region, replicated across every attached client.
#[derive(Debug, Default)]
pub(crate) struct RegionState {
    pub(crate) entries: DashMap<String, Bytes>,
    pub(crate) queues: DashMap<(String, u32), Arc<GridQueue>>,
}

/// Client handle onto a named region.
///
/// Cheap to clone; all handles for one region name observe the same
/// entries and queues, regardless of which grid client created them.
#[derive(Clone)]
pub struct RegionHandle {
    name: String,
    state: Arc<RegionState>,
    shared: Arc<GridShared>,
}

impl RegionHandle {
    pub(crate) fn new(name: String, state: Arc<RegionState>, shared: Arc<GridShared>) -> Self {
        Self { name, state, shared }
    }

    /// Region name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Put an entry, returning the previous value if any.
    ///
    /// # Errors
    /// Returns a transport error when the grid is unavailable.
    pub fn put(&self, key: &str, value: Bytes) -> Result<Option<Bytes>> {
        self.shared.ensure_available()?;
        Ok(self.state.entries.insert(key.to_string(), value))
    }

    /// Put an entry only when the key is absent. Returns the existing
    /// value when the key was already present.
    ///
    /// # Errors
    /// Returns a transport error when the grid is unavailable.
    pub fn put_if_absent(&self, key: &str, value: Bytes) -> Result<Option<Bytes>> {
        self.shared.ensure_available()?;
        match self.state.entries.entry(key.to_string()) {
            Entry::Occupied(occupied) => Ok(Some(occupied.get().clone())),
            Entry::Vacant(vacant) => {
                vacant.insert(value);
                Ok(None)
            },
        }
    }

    /// Get an entry value.
    ///
    /// # Errors
    /// Returns a transport error when the grid is unavailable.
    pub fn get(&self, key: &str) -> Result<Option<Bytes>> {
        self.shared.ensure_available()?;
        Ok(self.state.entries.get(key).map(|entry| entry.value().clone()))
    }

    /// Remove an entry, returning its value if it existed.
    ///
    /// # Errors
    /// Returns a transport error when the grid is unavailable.
    pub fn remove(&self, key: &str) -> Result<Option<Bytes>> {
        self.shared.ensure_available()?;
        Ok(self.state.entries.remove(key).map(|(_, value)| value))
    }

    /// Keys starting with the given prefix, in unspecified order.
    ///
    /// # Errors
    /// Returns a transport error when the grid is unavailable.
    pub fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        self.shared.ensure_available()?;
        Ok(self
            .state
            .entries
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.key().clone())
            .collect())
    }

    /// Delivery queue for one (view, partition) pair, created on first use.
    ///
    /// # Errors
    /// Returns a transport error when the grid is unavailable.
    pub fn queue(&self, view: &str, partition: PartitionId) -> Result<Arc<GridQueue>> {
        self.shared.ensure_available()?;
        Ok(self
            .state
            .queues
            .entry((view.to_string(), partition.value()))
            .or_default()
            .clone())
    }

    /// Drop every queue belonging to the given view, releasing its
    /// pending messages. Returns the number of queues removed.
    ///
    /// # Errors
    /// Returns a transport error when the grid is unavailable.
    pub fn drop_queues(&self, view: &str) -> Result<usize> {
        self.shared.ensure_available()?;
        let before = self.state.queues.len();
        self.state.queues.retain(|(queue_view, _), _| queue_view != view);
        Ok(before - self.state.queues.len())
    }
}

impl fmt::Debug for RegionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegionHandle")
            .field("name", &self.name)
            .field("entries", &self.state.entries.len())
            .field("queues", &self.state.queues.len())
            .finish()
    }
}
