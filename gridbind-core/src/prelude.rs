//! # Prelude
//!
//! Convenient access to commonly used types and traits from the gridbind
//! core library.

pub use crate::{
    channel::{LocalChannel, MessageHandler, SubscribableChannel, SubscriptionId},
    config::{
        BinderConfig, ConsumerProperties, PartitionKeyExtractor, PartitionSelector,
        PayloadKeyExtractor, ProducerProperties,
    },
    error::{Error, Result},
    message::{Message, MessageBuilder, MessageEnvelope, MessageId},
    types::{BindingName, PartitionId, Timestamp},
};

// Re-export commonly used foreign types
pub use bytes::Bytes;
pub use chrono::{DateTime, Utc};
