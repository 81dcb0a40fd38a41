//! # Gridbind Grid
//!
//! Replicated data-grid transport abstraction for the gridbind binder.
//!
//! The binder uses grid regions as its wire: key/value entries carry the
//! shared coordination state (group-view registry, binding metadata), and
//! per-view, per-partition queues carry the encoded message envelopes. This
//! crate provides that contract plus an in-process simulated grid where
//! independent tasks play the role of separate grid member processes,
//! keeping tests fast and deterministic.
//!
//! ## Quick Start
//!
//! ```rust
//! use gridbind_grid::Grid;
//! use gridbind_core::PartitionId;
//! use bytes::Bytes;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> gridbind_core::Result<()> {
//! let grid = Grid::new();
//!
//! // Two clients, standing in for two processes.
//! let producer = grid.client("producer").create_or_attach("binding.test")?;
//! let consumer = grid.client("consumer").create_or_attach("binding.test")?;
//!
//! producer.queue("test.group-a", PartitionId::new(0))?.push(Bytes::from("hi"));
//! let received = consumer
//!     .queue("test.group-a", PartitionId::new(0))?
//!     .poll(std::time::Duration::from_secs(1))
//!     .await;
//! assert_eq!(received, Some(Bytes::from("hi")));
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod grid;
pub mod queue;
pub mod region;

pub use grid::{Grid, GridClient};
pub use queue::GridQueue;
pub use region::RegionHandle;
