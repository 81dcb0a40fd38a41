//! Binder and binding configuration.
//!
//! Partition keys are extracted by an explicit [`PartitionKeyExtractor`]
//! registered at bind time rather than by evaluating a string expression
//! against the message; the default extractor keys on the whole payload.

use crate::message::Message;
use crate::{Error, Result};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Pure strategy mapping an extracted key to a partition index.
///
/// Invoked exactly once per outbound message when partitioning is enabled
/// and a custom strategy is configured. The returned index is used verbatim
/// (no internal modulo reduction); an out-of-range index fails that send
/// with a routing error.
pub trait PartitionSelector: Send + Sync {
    /// Select a partition index in `[0, partition_count)` for the given key.
    fn select(&self, key: &[u8], partition_count: u32) -> u32;
}

/// Extracts the partition key from an outbound message.
pub trait PartitionKeyExtractor: Send + Sync {
    /// Extract the key; failure fails the routing of that message.
    ///
    /// # Errors
    /// Returns a routing error when no key can be derived.
    fn extract(&self, message: &Message) -> Result<Vec<u8>>;
}

/// Default extractor: the message payload is the key.
#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadKeyExtractor;

impl PartitionKeyExtractor for PayloadKeyExtractor {
    fn extract(&self, message: &Message) -> Result<Vec<u8>> {
        Ok(message.payload.to_vec())
    }
}

/// Extractor reading the key from a named message header.
#[derive(Debug, Clone)]
pub struct HeaderKeyExtractor {
    header: String,
}

impl HeaderKeyExtractor {
    /// Create an extractor keyed on the given header name.
    #[must_use]
    pub fn new(header: impl Into<String>) -> Self {
        Self { header: header.into() }
    }
}

impl PartitionKeyExtractor for HeaderKeyExtractor {
    fn extract(&self, message: &Message) -> Result<Vec<u8>> {
        message
            .header(&self.header)
            .map(|value| value.as_bytes().to_vec())
            .ok_or_else(|| Error::Routing {
                message: format!("partition key header '{}' is missing", self.header),
            })
    }
}

/// Binder-wide configuration.
#[derive(Debug, Clone)]
pub struct BinderConfig {
    /// Maximum number of messages a consumer listener accumulates before
    /// delivering to the local channel.
    pub batch_size: usize,

    /// Bounded wait per listener poll iteration; the cancellation flag is
    /// re-checked at least this often.
    pub poll_timeout: Duration,

    /// Grace period granted to listener tasks during unbind/shutdown.
    pub shutdown_grace: Duration,
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self {
            batch_size: 1,
            poll_timeout: Duration::from_millis(100),
            shutdown_grace: Duration::from_secs(5),
        }
    }
}

impl BinderConfig {
    /// Create a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the consumer batch size.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the listener poll timeout.
    #[must_use]
    pub fn with_poll_timeout(mut self, poll_timeout: Duration) -> Self {
        self.poll_timeout = poll_timeout;
        self
    }

    /// Set the shutdown grace period.
    #[must_use]
    pub fn with_shutdown_grace(mut self, shutdown_grace: Duration) -> Self {
        self.shutdown_grace = shutdown_grace;
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    /// Returns `Error::InvalidParameter` if any value is out of range.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::InvalidParameter {
                parameter: "batch_size".to_string(),
                value: self.batch_size.to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        if self.poll_timeout.is_zero() {
            return Err(Error::InvalidParameter {
                parameter: "poll_timeout".to_string(),
                value: format!("{:?}", self.poll_timeout),
                reason: "must be greater than 0".to_string(),
            });
        }

        if self.shutdown_grace.is_zero() {
            return Err(Error::InvalidParameter {
                parameter: "shutdown_grace".to_string(),
                value: format!("{:?}", self.shutdown_grace),
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

/// Per-binding producer properties.
#[derive(Clone)]
pub struct ProducerProperties {
    /// Whether outbound messages are partitioned by key.
    pub partitioned: bool,

    /// Number of logical shards; fixed for the binding's lifetime.
    /// Ignored (treated as 1) when partitioning is disabled.
    pub partition_count: u32,

    /// Key extractor; defaults to [`PayloadKeyExtractor`] when absent.
    pub key_extractor: Option<Arc<dyn PartitionKeyExtractor>>,

    /// Custom partition selector; the default strategy hashes the key
    /// modulo the partition count when absent.
    pub partition_selector: Option<Arc<dyn PartitionSelector>>,
}

impl Default for ProducerProperties {
    fn default() -> Self {
        Self { partitioned: false, partition_count: 1, key_extractor: None, partition_selector: None }
    }
}

impl ProducerProperties {
    /// Create default producer properties (unpartitioned).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable partitioning with the given shard count.
    #[must_use]
    pub fn partitioned(mut self, partition_count: u32) -> Self {
        self.partitioned = true;
        self.partition_count = partition_count;
        self
    }

    /// Register a key extractor.
    #[must_use]
    pub fn with_key_extractor(mut self, extractor: Arc<dyn PartitionKeyExtractor>) -> Self {
        self.key_extractor = Some(extractor);
        self
    }

    /// Register a custom partition selector.
    #[must_use]
    pub fn with_partition_selector(mut self, selector: Arc<dyn PartitionSelector>) -> Self {
        self.partition_selector = Some(selector);
        self
    }

    /// Effective shard count for routing and queue layout.
    #[must_use]
    pub fn effective_partition_count(&self) -> u32 {
        if self.partitioned {
            self.partition_count
        } else {
            1
        }
    }

    /// Validate the properties.
    ///
    /// # Errors
    /// Returns `Error::InvalidParameter` if the partition count is zero
    /// while partitioning is enabled.
    pub fn validate(&self) -> Result<()> {
        if self.partitioned && self.partition_count == 0 {
            return Err(Error::InvalidParameter {
                parameter: "partition_count".to_string(),
                value: self.partition_count.to_string(),
                reason: "must be greater than 0 when partitioned".to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for ProducerProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProducerProperties")
            .field("partitioned", &self.partitioned)
            .field("partition_count", &self.partition_count)
            .field("key_extractor", &self.key_extractor.as_ref().map(|_| "<custom>"))
            .field("partition_selector", &self.partition_selector.as_ref().map(|_| "<custom>"))
            .finish()
    }
}

/// Per-binding consumer properties.
#[derive(Debug, Clone)]
pub struct ConsumerProperties {
    /// Number of logical shards the consumer polls. Must match the
    /// producer side; the grid-recorded count wins on disagreement.
    pub partition_count: u32,

    /// Batch size override; falls back to [`BinderConfig::batch_size`].
    pub batch_size: Option<usize>,
}

impl Default for ConsumerProperties {
    fn default() -> Self {
        Self { partition_count: 1, batch_size: None }
    }
}

impl ConsumerProperties {
    /// Create default consumer properties.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shard count to poll.
    #[must_use]
    pub fn with_partition_count(mut self, partition_count: u32) -> Self {
        self.partition_count = partition_count;
        self
    }

    /// Override the binder-wide batch size.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    /// Validate the properties.
    ///
    /// # Errors
    /// Returns `Error::InvalidParameter` if any value is out of range.
    pub fn validate(&self) -> Result<()> {
        if self.partition_count == 0 {
            return Err(Error::InvalidParameter {
                parameter: "partition_count".to_string(),
                value: self.partition_count.to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        if let Some(batch_size) = self.batch_size {
            if batch_size == 0 {
                return Err(Error::InvalidParameter {
                    parameter: "batch_size".to_string(),
                    value: batch_size.to_string(),
                    reason: "must be greater than 0".to_string(),
                });
            }
        }

        Ok(())
    }
}
