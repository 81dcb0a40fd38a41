//! # Gridbind
//!
//! Message-channel binder over a replicated data grid.
//!
//! Gridbind attaches an application's local publish/subscribe channels to
//! grid regions used as the transport, so producers and consumers in
//! separate processes exchange messages without a dedicated broker:
//!
//! - **Partition routing**: keyed messages map to a fixed number of
//!   logical shards via a pluggable selection strategy
//! - **Consumer groups**: members sharing a group name act as one logical
//!   subscriber (each message delivered once per group), while distinct
//!   groups and ungrouped consumers each receive a full copy
//! - **Lifecycle**: `bind_producer` / `bind_consumer` / `unbind` with
//!   idempotent unbind and conflict detection for double binds
//!
//! ## Quick Start
//!
//! ```rust
//! use gridbind::GridBinder;
//! use gridbind_core::{BinderConfig, ConsumerProperties, LocalChannel, Message,
//!     ProducerProperties, SubscribableChannel};
//! use gridbind_grid::Grid;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> gridbind_core::Result<()> {
//! let grid = Grid::new();
//!
//! let consumer = GridBinder::new(grid.client("consumer"), BinderConfig::default());
//! consumer.init()?;
//! let inbound = Arc::new(LocalChannel::new());
//! consumer.bind_consumer("orders", Some("billing"), inbound, ConsumerProperties::new())?;
//!
//! let producer = GridBinder::new(grid.client("producer"), BinderConfig::default());
//! producer.init()?;
//! let outbound = Arc::new(LocalChannel::new());
//! producer.bind_producer("orders", outbound.clone(), ProducerProperties::new())?;
//!
//! outbound.send(Message::new("hello world")).await?;
//! # consumer.shutdown().await;
//! # producer.shutdown().await;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod binder;
pub mod coordinator;
pub mod dispatcher;
pub mod listener;
pub mod router;

pub use binder::{binding_region_name, BindingDirection, BindingStatus, GridBinder};
pub use coordinator::{GroupCoordinator, ViewId};
pub use dispatcher::ProducerDispatcher;
pub use listener::{ConsumerListener, ListenerHandle};
pub use router::{PartitionRouter, RouteDecision};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{BindingDirection, BindingStatus, GridBinder, ViewId};
    pub use gridbind_core::prelude::*;
    pub use gridbind_grid::{Grid, GridClient, RegionHandle};
}
