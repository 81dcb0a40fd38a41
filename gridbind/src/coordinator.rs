//! Consumer-group coordination through grid state.
//!
//! A group view is the concrete queue set backing one (binding, group)
//! pair. Named groups resolve to the same view in every process and across
//! restarts; an absent group yields a fresh view unique to that bind call.
//! View registration lives in the binding's grid region so the producer
//! side enumerates views from shared state, never from a process-local
//! cache.

use bytes::Bytes;
use gridbind_core::{BindingName, Result};
use gridbind_grid::RegionHandle;
use std::fmt;
use uuid::Uuid;

/// Region entry key prefix under which group views are registered.
const VIEW_KEY_PREFIX: &str = "view.";

/// Identifier of a group view within a binding's region.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ViewId(String);

impl ViewId {
    /// View id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Maps (binding, group) pairs to group views and keeps the view registry
/// in the binding's grid region.
#[derive(Debug, Clone)]
pub struct GroupCoordinator {
    binding: BindingName,
    region: RegionHandle,
}

impl GroupCoordinator {
    /// Create a coordinator for one binding's region.
    #[must_use]
    pub fn new(binding: BindingName, region: RegionHandle) -> Self {
        Self { binding, region }
    }

    /// Resolve the view for the given group.
    ///
    /// Deterministic for named groups; a fresh unshared view per call when
    /// the group is absent.
    #[must_use]
    pub fn resolve_view(&self, group: Option<&str>) -> ViewId {
        match group {
            Some(group) => ViewId(format!("{}.{group}", self.binding)),
            None => ViewId(format!("{}.anon-{}", self.binding, Uuid::new_v4())),
        }
    }

    /// Register a view in the region. The first registration for a view
    /// creates it; later registrations attach. Returns whether this call
    /// created the view.
    ///
    /// # Errors
    /// Returns a transport error when the grid is unavailable.
    pub fn register_view(&self, view: &ViewId, member: &str) -> Result<bool> {
        let key = format!("{VIEW_KEY_PREFIX}{view}");
        let created = self.region.put_if_absent(&key, Bytes::from(member.to_string()))?.is_none();
        if created {
            tracing::debug!(binding = %self.binding, view = %view, member, "group view created");
        }
        Ok(created)
    }

    /// Remove a view from the registry and release its queues. Used for
    /// anonymous views on unbind; named views outlive their members so a
    /// restarted group keeps its backlog.
    ///
    /// # Errors
    /// Returns a transport error when the grid is unavailable.
    pub fn deregister_view(&self, view: &ViewId) -> Result<()> {
        let key = format!("{VIEW_KEY_PREFIX}{view}");
        self.region.remove(&key)?;
        let dropped = self.region.drop_queues(view.as_str())?;
        tracing::debug!(binding = %self.binding, view = %view, dropped, "group view removed");
        Ok(())
    }

    /// Every view currently registered for the binding.
    ///
    /// # Errors
    /// Returns a transport error when the grid is unavailable.
    pub fn registered_views(&self) -> Result<Vec<ViewId>> {
        let keys = self.region.keys_with_prefix(VIEW_KEY_PREFIX)?;
        Ok(keys
            .into_iter()
            .map(|key| ViewId(key[VIEW_KEY_PREFIX.len()..].to_string()))
            .collect())
    }
}
