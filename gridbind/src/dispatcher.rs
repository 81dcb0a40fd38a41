//! Producer-side dispatch from the local channel into the grid.

use crate::coordinator::GroupCoordinator;
use crate::router::PartitionRouter;
use async_trait::async_trait;
use gridbind_core::{BindingName, Message, MessageEnvelope, MessageHandler, Result};
use gridbind_grid::RegionHandle;
use std::sync::atomic::{AtomicU64, Ordering};

/// Subscribed to the local producer channel; routes each outbound message
/// and enqueues one copy per registered group view.
pub struct ProducerDispatcher {
    binding: BindingName,
    router: PartitionRouter,
    coordinator: GroupCoordinator,
    region: RegionHandle,
    dispatched: AtomicU64,
}

impl ProducerDispatcher {
    /// Create a dispatcher for one producer binding.
    #[must_use]
    pub fn new(
        binding: BindingName,
        router: PartitionRouter,
        coordinator: GroupCoordinator,
        region: RegionHandle,
    ) -> Self {
        Self { binding, router, coordinator, region, dispatched: AtomicU64::new(0) }
    }

    /// Messages dispatched into the grid so far.
    #[must_use]
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    /// Route, wrap, and fan out one message.
    ///
    /// The partition is resolved once and the envelope encoded once; every
    /// registered view receives its own copy. A send with no registered
    /// views is dropped, never an error: producers may start before
    /// consumers.
    ///
    /// # Errors
    /// Routing, serialization, and transport failures are surfaced to the
    /// caller and leave no partial state behind for that message.
    pub fn dispatch(&self, message: Message) -> Result<()> {
        let decision = self.router.route(&message)?;

        let views = self.coordinator.registered_views()?;
        if views.is_empty() {
            tracing::debug!(
                binding = %self.binding,
                "no group views registered; dropping message"
            );
            return Ok(());
        }

        let envelope = MessageEnvelope::wrap(message, decision.partition, decision.key);
        let encoded = envelope.encode()?;

        for view in &views {
            self.region.queue(view.as_str(), decision.partition)?.push(encoded.clone());
        }

        self.dispatched.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(
            binding = %self.binding,
            partition = %decision.partition,
            views = views.len(),
            "message dispatched"
        );
        Ok(())
    }
}

#[async_trait]
impl MessageHandler for ProducerDispatcher {
    async fn handle(&self, message: Message) -> Result<()> {
        self.dispatch(message)
    }
}
