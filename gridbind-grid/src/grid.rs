//! Simulated replicated data grid.
//!
//! Models the external grid engine's contract for a single host: named
//! regions with create-or-attach semantics, write visibility across every
//! attached client, and an availability switch so transport failures are
//! testable. Each [`GridClient`] stands in for one member process of the
//! real grid.

use crate::region::{RegionHandle, RegionState};
use gridbind_core::{Error, Result};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

#[derive(Debug, Default)]
pub(crate) struct GridShared {
    regions: DashMap<String, Arc<RegionState>>,
    unavailable: AtomicBool,
}

impl GridShared {
    pub(crate) fn ensure_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::Acquire) {
            return Err(Error::Transport {
                message: "grid is unavailable".to_string(),
            });
        }
        Ok(())
    }
}

/// An in-process grid cluster.
///
/// All clients created from one `Grid` observe the same replicated state,
/// the way separate processes attached to one real grid would.
#[derive(Debug, Clone, Default)]
pub struct Grid {
    shared: Arc<GridShared>,
}

impl Grid {
    /// Create a new empty grid.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a new member client to the grid.
    #[must_use]
    pub fn client(&self, member: impl Into<String>) -> GridClient {
        let member = member.into();
        tracing::debug!(member = %member, "grid member attached");
        GridClient { member, shared: self.shared.clone() }
    }

    /// Toggle grid availability. While unavailable, every client
    /// operation fails with a transport error.
    pub fn set_available(&self, available: bool) {
        self.shared.unavailable.store(!available, Ordering::Release);
    }

    /// Whether the grid currently accepts operations.
    #[must_use]
    pub fn is_available(&self) -> bool {
        !self.shared.unavailable.load(Ordering::Acquire)
    }

    /// Number of regions that exist on the grid.
    #[must_use]
    pub fn region_count(&self) -> usize {
        self.shared.regions.len()
    }
}

/// Per-member handle onto the grid.
#[derive(Clone)]
pub struct GridClient {
    member: String,
    shared: Arc<GridShared>,
}

impl GridClient {
    /// Name of the grid member this client represents.
    #[must_use]
    pub fn member(&self) -> &str {
        &self.member
    }

    /// Create the named region, or attach to it when it already exists.
    ///
    /// # Errors
    /// Returns a transport error when the grid is unavailable.
    pub fn create_or_attach(&self, name: &str) -> Result<RegionHandle> {
        self.shared.ensure_available()?;

        let state = self
            .shared
            .regions
            .entry(name.to_string())
            .or_insert_with(|| {
                tracing::debug!(region = name, member = %self.member, "region created");
                Arc::new(RegionState::default())
            })
            .clone();

        Ok(RegionHandle::new(name.to_string(), state, self.shared.clone()))
    }
}

impl fmt::Debug for GridClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridClient").field("member", &self.member).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_or_attach_is_idempotent() {
        let grid = Grid::new();
        let client = grid.client("m1");

        client.create_or_attach("binding.orders").unwrap();
        client.create_or_attach("binding.orders").unwrap();
        assert_eq!(grid.region_count(), 1);
    }

    #[test]
    fn test_unavailable_grid_rejects_operations() {
        let grid = Grid::new();
        let client = grid.client("m1");
        let region = client.create_or_attach("binding.orders").unwrap();

        grid.set_available(false);
        assert!(!grid.is_available());
        assert!(matches!(
            client.create_or_attach("binding.other"),
            Err(Error::Transport { .. })
        ));
        assert!(matches!(
            region.put("k", bytes::Bytes::from("v")),
            Err(Error::Transport { .. })
        ));

        grid.set_available(true);
        assert!(region.put("k", bytes::Bytes::from("v")).is_ok());
    }
}
