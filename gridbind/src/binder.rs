//! Binder facade: wires channels, router, coordinator, dispatcher, and
//! listener together per binding name.

use crate::coordinator::GroupCoordinator;
use crate::dispatcher::ProducerDispatcher;
use crate::listener::{ConsumerListener, ListenerHandle};
use crate::router::PartitionRouter;
use bytes::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use gridbind_core::{
    BinderConfig, BindingName, ConsumerProperties, Error, ProducerProperties, Result,
    SubscribableChannel, SubscriptionId,
};
use gridbind_grid::{GridClient, RegionHandle};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Region entry key recording the binding's fixed partition count.
const PARTITION_COUNT_KEY: &str = "meta.partition_count";

/// Name of the grid region backing a binding.
#[must_use]
pub fn binding_region_name(binding: &BindingName) -> String {
    format!("gridbind.{binding}")
}

/// Direction of a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingDirection {
    /// Local channel feeds the grid.
    Producer,
    /// Grid feeds the local channel.
    Consumer,
}

/// Point-in-time status of one binding, for tests and operators.
#[derive(Debug, Clone)]
pub struct BindingStatus {
    /// Binding name.
    pub name: String,
    /// Producer or consumer.
    pub direction: BindingDirection,
    /// Group view a consumer binding reads from.
    pub view: Option<String>,
    /// Messages delivered (consumer) or dispatched (producer) so far.
    pub delivered: u64,
}

enum BindingKind {
    Producer {
        channel: Arc<dyn SubscribableChannel>,
        subscription: SubscriptionId,
        dispatcher: Arc<ProducerDispatcher>,
    },
    Consumer {
        listener: ListenerHandle,
        coordinator: GroupCoordinator,
        anonymous: bool,
    },
}

struct BindingEntry {
    name: BindingName,
    kind: BindingKind,
}

/// Binds local publish/subscribe channels to the grid transport.
///
/// Lifecycle: construct, `init()`, then `bind_producer` / `bind_consumer` /
/// `unbind`. Binds before `init()` fail with a configuration error; a
/// second bind for an already-bound name fails with a conflict. `unbind`
/// is idempotent.
pub struct GridBinder {
    client: GridClient,
    config: BinderConfig,
    initialized: AtomicBool,
    bindings: DashMap<String, BindingEntry>,
}

impl GridBinder {
    /// Create a binder over the given grid client.
    #[must_use]
    pub fn new(client: GridClient, config: BinderConfig) -> Self {
        Self { client, config, initialized: AtomicBool::new(false), bindings: DashMap::new() }
    }

    /// Validate configuration and mark the binder ready for binds.
    ///
    /// # Errors
    /// Returns a configuration error when the binder config is invalid.
    pub fn init(&self) -> Result<()> {
        self.config.validate()?;
        self.initialized.store(true, Ordering::Release);
        tracing::info!(member = self.client.member(), "binder initialized");
        Ok(())
    }

    fn ensure_initialized(&self) -> Result<()> {
        if !self.initialized.load(Ordering::Acquire) {
            return Err(Error::NotInitialized);
        }
        Ok(())
    }

    /// Bind a producer channel: outbound messages on `channel` are routed
    /// and enqueued into the grid for every registered group view.
    ///
    /// # Errors
    /// Fails with a configuration error before `init()`, a conflict error
    /// when the name is already bound, and a transport error when the
    /// binding's region cannot be attached.
    pub fn bind_producer(
        &self,
        name: &str,
        channel: Arc<dyn SubscribableChannel>,
        properties: ProducerProperties,
    ) -> Result<()> {
        self.ensure_initialized()?;
        properties.validate()?;
        let binding = BindingName::new(name)?;

        match self.bindings.entry(binding.as_str().to_string()) {
            Entry::Occupied(_) => Err(Error::BindingConflict { name: binding.into_string() }),
            Entry::Vacant(vacant) => {
                let region = self.attach_region(&binding)?;
                let partition_count = self.record_partition_count(
                    &binding,
                    &region,
                    properties.effective_partition_count(),
                )?;

                // The grid-recorded count wins; the router must agree with
                // the queues consumers are polling.
                let mut properties = properties;
                if properties.partitioned {
                    properties.partition_count = partition_count;
                }
                let router = PartitionRouter::from_properties(&properties);
                let coordinator = GroupCoordinator::new(binding.clone(), region.clone());
                let dispatcher = Arc::new(ProducerDispatcher::new(
                    binding.clone(),
                    router,
                    coordinator,
                    region,
                ));
                let subscription = channel.subscribe(dispatcher.clone());

                tracing::info!(binding = %binding, "producer bound");
                vacant.insert(BindingEntry {
                    name: binding,
                    kind: BindingKind::Producer { channel, subscription, dispatcher },
                });
                Ok(())
            },
        }
    }

    /// Bind a consumer channel: inbound messages from the binding's group
    /// view are delivered to `channel`. A `group` of `None` yields an
    /// unshared view receiving a full copy of the stream.
    ///
    /// # Errors
    /// Fails with a configuration error before `init()`, a conflict error
    /// when the name is already bound, and a transport error when the
    /// binding's region cannot be attached.
    pub fn bind_consumer(
        &self,
        name: &str,
        group: Option<&str>,
        channel: Arc<dyn SubscribableChannel>,
        properties: ConsumerProperties,
    ) -> Result<()> {
        self.ensure_initialized()?;
        properties.validate()?;
        let binding = BindingName::new(name)?;

        match self.bindings.entry(binding.as_str().to_string()) {
            Entry::Occupied(_) => Err(Error::BindingConflict { name: binding.into_string() }),
            Entry::Vacant(vacant) => {
                let region = self.attach_region(&binding)?;
                let partition_count =
                    self.record_partition_count(&binding, &region, properties.partition_count)?;

                let coordinator = GroupCoordinator::new(binding.clone(), region.clone());
                let view = coordinator.resolve_view(group);
                coordinator.register_view(&view, self.client.member())?;

                let batch_size = properties.batch_size.unwrap_or(self.config.batch_size);
                let listener = ConsumerListener::spawn(
                    region,
                    view,
                    partition_count,
                    channel,
                    batch_size,
                    self.config.poll_timeout,
                );

                tracing::info!(binding = %binding, group = group.unwrap_or("<none>"), "consumer bound");
                vacant.insert(BindingEntry {
                    name: binding,
                    kind: BindingKind::Consumer {
                        listener,
                        coordinator,
                        anonymous: group.is_none(),
                    },
                });
                Ok(())
            },
        }
    }

    /// Unbind by name. Unknown or already-unbound names are a no-op.
    ///
    /// Consumer listeners are stopped within the configured grace period;
    /// anonymous group views are deregistered and their queues released.
    pub async fn unbind(&self, name: &str) {
        let Some((_, entry)) = self.bindings.remove(name) else {
            tracing::debug!(binding = name, "unbind of unknown binding ignored");
            return;
        };

        match entry.kind {
            BindingKind::Producer { channel, subscription, .. } => {
                channel.unsubscribe(subscription);
            },
            BindingKind::Consumer { listener, coordinator, anonymous } => {
                let view = listener.view().clone();
                listener.shutdown(self.config.shutdown_grace).await;
                if anonymous {
                    if let Err(err) = coordinator.deregister_view(&view) {
                        tracing::warn!(binding = %entry.name, %err, "failed to release group view");
                    }
                }
            },
        }

        tracing::info!(binding = %entry.name, "binding removed");
    }

    /// Unbind everything this binder owns.
    pub async fn shutdown(&self) {
        let names: Vec<String> =
            self.bindings.iter().map(|entry| entry.key().clone()).collect();
        for name in names {
            self.unbind(&name).await;
        }
        tracing::info!(member = self.client.member(), "binder shut down");
    }

    /// Whether the named binding is currently bound.
    #[must_use]
    pub fn is_bound(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Status of the named binding, if bound.
    #[must_use]
    pub fn status(&self, name: &str) -> Option<BindingStatus> {
        let entry = self.bindings.get(name)?;
        Some(match &entry.kind {
            BindingKind::Producer { dispatcher, .. } => BindingStatus {
                name: entry.name.as_str().to_string(),
                direction: BindingDirection::Producer,
                view: None,
                delivered: dispatcher.dispatched(),
            },
            BindingKind::Consumer { listener, .. } => BindingStatus {
                name: entry.name.as_str().to_string(),
                direction: BindingDirection::Consumer,
                view: Some(listener.view().to_string()),
                delivered: listener.delivered(),
            },
        })
    }

    fn attach_region(&self, binding: &BindingName) -> Result<RegionHandle> {
        self.client.create_or_attach(&binding_region_name(binding))
    }

    /// Record the binding's partition count in grid state on first bind;
    /// later binds must agree with the recorded value, which wins.
    fn record_partition_count(
        &self,
        binding: &BindingName,
        region: &RegionHandle,
        partition_count: u32,
    ) -> Result<u32> {
        let encoded = Bytes::copy_from_slice(&partition_count.to_le_bytes());
        match region.put_if_absent(PARTITION_COUNT_KEY, encoded)? {
            None => Ok(partition_count),
            Some(existing) => {
                let bytes: [u8; 4] = existing.as_ref().try_into().map_err(|_| Error::Internal {
                    message: format!("corrupt partition count entry for binding '{binding}'"),
                })?;
                let recorded = u32::from_le_bytes(bytes);
                if recorded != partition_count {
                    tracing::warn!(
                        binding = %binding,
                        recorded,
                        requested = partition_count,
                        "partition count differs from grid-recorded value; using recorded"
                    );
                }
                Ok(recorded)
            },
        }
    }
}

impl fmt::Debug for GridBinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridBinder")
            .field("member", &self.client.member())
            .field("initialized", &self.initialized.load(Ordering::Acquire))
            .field("bindings", &self.bindings.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridbind_core::LocalChannel;
    use gridbind_grid::Grid;

    fn binder(grid: &Grid, member: &str) -> GridBinder {
        let binder = GridBinder::new(grid.client(member), BinderConfig::default());
        binder.init().unwrap();
        binder
    }

    #[tokio::test]
    async fn test_bind_before_init_fails() {
        let grid = Grid::new();
        let binder = GridBinder::new(grid.client("m1"), BinderConfig::default());

        let result = binder.bind_producer(
            "test",
            Arc::new(LocalChannel::new()),
            ProducerProperties::new(),
        );
        assert!(matches!(result, Err(Error::NotInitialized)));
    }

    #[tokio::test]
    async fn test_second_bind_for_same_name_conflicts() {
        let grid = Grid::new();
        let binder = binder(&grid, "m1");

        binder
            .bind_producer("test", Arc::new(LocalChannel::new()), ProducerProperties::new())
            .unwrap();
        let result = binder.bind_producer(
            "test",
            Arc::new(LocalChannel::new()),
            ProducerProperties::new(),
        );
        assert!(matches!(result, Err(Error::BindingConflict { .. })));
    }

    #[tokio::test]
    async fn test_unbind_is_idempotent() {
        let grid = Grid::new();
        let binder = binder(&grid, "m1");

        binder
            .bind_consumer(
                "test",
                Some("g"),
                Arc::new(LocalChannel::new()),
                ConsumerProperties::new(),
            )
            .unwrap();
        assert!(binder.is_bound("test"));

        binder.unbind("test").await;
        assert!(!binder.is_bound("test"));
        binder.unbind("test").await;
        binder.unbind("never-bound").await;
    }

    #[tokio::test]
    async fn test_status_reflects_direction_and_view() {
        let grid = Grid::new();
        let binder = binder(&grid, "m1");

        binder
            .bind_consumer(
                "test",
                Some("a"),
                Arc::new(LocalChannel::new()),
                ConsumerProperties::new(),
            )
            .unwrap();

        let status = binder.status("test").unwrap();
        assert_eq!(status.direction, BindingDirection::Consumer);
        assert_eq!(status.view.as_deref(), Some("test.a"));
        assert_eq!(status.delivered, 0);

        assert!(binder.status("missing").is_none());
        binder.shutdown().await;
    }

    #[tokio::test]
    async fn test_grid_recorded_partition_count_wins() {
        let grid = Grid::new();
        let producer_binder = binder(&grid, "producer");
        let consumer_binder = binder(&grid, "consumer");

        producer_binder
            .bind_producer(
                "test",
                Arc::new(LocalChannel::new()),
                ProducerProperties::new().partitioned(4),
            )
            .unwrap();

        // Disagreeing consumer attaches with the recorded count.
        consumer_binder
            .bind_consumer(
                "test",
                Some("g"),
                Arc::new(LocalChannel::new()),
                ConsumerProperties::new().with_partition_count(2),
            )
            .unwrap();

        consumer_binder.shutdown().await;
        producer_binder.shutdown().await;
    }
}
