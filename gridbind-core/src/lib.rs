//! # Gridbind Core
//!
//! Core library for the gridbind message-channel binder: shared types, the
//! message/envelope model, local channel traits, binding configuration, and
//! the error taxonomy.
//!
//! A binder attaches an application's local publish/subscribe channels to a
//! replicated data-grid transport so producers and consumers in separate
//! processes exchange messages without a dedicated broker. This crate holds
//! everything both sides of that attachment agree on:
//!
//! - [`message`]: local [`Message`] and the transport [`MessageEnvelope`]
//! - [`channel`]: `send`/`subscribe` channel traits and an in-process
//!   implementation
//! - [`config`]: binder configuration and per-binding properties, including
//!   the partition key-extraction and selection strategies
//! - [`types`]: binding names, partition ids, timestamps
//! - [`error`]: error types and result handling
//!
//! ## Quick Start
//!
//! ```rust
//! use gridbind_core::{Message, MessageEnvelope, PartitionId};
//!
//! let message = Message::builder()
//!     .payload("hello world")
//!     .header("origin", "docs")
//!     .build();
//!
//! let envelope = MessageEnvelope::wrap(message, PartitionId::new(0), None);
//! let wire = envelope.encode().expect("envelope encodes");
//! let decoded = MessageEnvelope::decode(&wire).expect("envelope decodes");
//! assert_eq!(decoded.into_message().payload, "hello world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod channel;
pub mod config;
pub mod error;
pub mod message;
pub mod prelude;
pub mod types;

// Core re-exports for convenience
pub use crate::{
    channel::{LocalChannel, MessageHandler, SubscribableChannel, SubscriptionId},
    config::{
        BinderConfig, ConsumerProperties, HeaderKeyExtractor, PartitionKeyExtractor,
        PartitionSelector, PayloadKeyExtractor, ProducerProperties,
    },
    error::{Error, Result},
    message::{Message, MessageBuilder, MessageEnvelope, MessageId},
    types::{BindingName, PartitionId, Timestamp},
};
