//! Partition routing for outbound messages.

use gridbind_core::{
    Error, Message, PartitionId, PartitionKeyExtractor, PartitionSelector, PayloadKeyExtractor,
    ProducerProperties, Result,
};
use std::collections::hash_map::DefaultHasher;
use std::hash::Hasher;
use std::sync::Arc;

/// Outcome of routing one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDecision {
    /// Target partition.
    pub partition: PartitionId,
    /// Extracted key, present when partitioning is enabled.
    pub key: Option<Vec<u8>>,
}

/// Derives a target partition for each outbound message.
///
/// With partitioning disabled every message routes to partition 0. With it
/// enabled, the configured key extractor produces the key and either the
/// default stable-hash strategy or a custom [`PartitionSelector`] maps it
/// to an index. A custom selector's return value is used verbatim, with no
/// modulo reduction; an out-of-range index fails the send with a routing
/// error.
#[derive(Clone)]
pub struct PartitionRouter {
    partitioned: bool,
    partition_count: u32,
    extractor: Arc<dyn PartitionKeyExtractor>,
    selector: Option<Arc<dyn PartitionSelector>>,
}

impl PartitionRouter {
    /// Build a router from producer properties.
    #[must_use]
    pub fn from_properties(properties: &ProducerProperties) -> Self {
        Self {
            partitioned: properties.partitioned,
            partition_count: properties.effective_partition_count(),
            extractor: properties
                .key_extractor
                .clone()
                .unwrap_or_else(|| Arc::new(PayloadKeyExtractor)),
            selector: properties.partition_selector.clone(),
        }
    }

    /// Number of partitions this router targets.
    #[must_use]
    pub fn partition_count(&self) -> u32 {
        self.partition_count
    }

    /// Route a message to its partition.
    ///
    /// The selector, when configured, is invoked exactly once per call.
    ///
    /// # Errors
    /// Returns `Error::Routing` when key extraction fails or a custom
    /// selector returns an index outside `[0, partition_count)`.
    pub fn route(&self, message: &Message) -> Result<RouteDecision> {
        if !self.partitioned {
            return Ok(RouteDecision { partition: PartitionId::new(0), key: None });
        }

        let key = self.extractor.extract(message).map_err(|err| Error::Routing {
            message: format!("partition key extraction failed: {err}"),
        })?;

        let index = match &self.selector {
            Some(selector) => {
                let index = selector.select(&key, self.partition_count);
                if index >= self.partition_count {
                    return Err(Error::Routing {
                        message: format!(
                            "partition selector returned {index}, outside [0, {})",
                            self.partition_count
                        ),
                    });
                }
                index
            },
            None => stable_hash(&key) % self.partition_count,
        };

        Ok(RouteDecision { partition: PartitionId::new(index), key: Some(key) })
    }
}

/// Stable hash of a key, constant for the lifetime of the binding.
///
/// `DefaultHasher` is deterministic within a build but its algorithm is not
/// pinned across Rust releases, so every member routing for one grid must
/// run the same build. Mixed-version deployments need a custom
/// [`PartitionSelector`] with a pinned hash.
#[allow(clippy::cast_possible_truncation)]
fn stable_hash(key: &[u8]) -> u32 {
    let mut hasher = DefaultHasher::new();
    hasher.write(key);
    let hash = hasher.finish();
    (hash ^ (hash >> 32)) as u32
}
