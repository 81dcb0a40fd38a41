//! Local messaging-channel abstraction.
//!
//! The binder treats local channels as an opaque delivery mechanism: a
//! producer-side channel is subscribed to by the binder's dispatcher, and a
//! consumer-side channel receives unwrapped inbound messages. The
//! [`LocalChannel`] implementation backs in-process applications and the
//! test suites.

use crate::message::Message;
use crate::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Handler invoked for every message delivered on a channel.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Handle a single message.
    async fn handle(&self, message: Message) -> Result<()>;

    /// Handle a batch of messages.
    ///
    /// The default forwards each message to [`MessageHandler::handle`].
    async fn handle_batch(&self, messages: Vec<Message>) -> Result<()> {
        for message in messages {
            self.handle(message).await?;
        }
        Ok(())
    }
}

/// Identifier for a registered channel subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A subscribable channel with `send`/`subscribe` semantics.
#[async_trait]
pub trait SubscribableChannel: Send + Sync {
    /// Send a single message to every subscribed handler.
    async fn send(&self, message: Message) -> Result<()>;

    /// Send a batch of messages.
    async fn send_batch(&self, messages: Vec<Message>) -> Result<()> {
        for message in messages {
            self.send(message).await?;
        }
        Ok(())
    }

    /// Register a handler; returns an id usable for [`SubscribableChannel::unsubscribe`].
    fn subscribe(&self, handler: Arc<dyn MessageHandler>) -> SubscriptionId;

    /// Remove a previously registered handler. Returns whether it existed.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

/// In-process channel implementation delivering each message to every
/// subscribed handler in subscription order.
#[derive(Default)]
pub struct LocalChannel {
    handlers: RwLock<BTreeMap<u64, Arc<dyn MessageHandler>>>,
    next_id: AtomicU64,
}

impl LocalChannel {
    /// Create a new channel with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of currently subscribed handlers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.handlers.read().len()
    }

    fn snapshot(&self) -> Vec<Arc<dyn MessageHandler>> {
        self.handlers.read().values().cloned().collect()
    }
}

impl fmt::Debug for LocalChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalChannel")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[async_trait]
impl SubscribableChannel for LocalChannel {
    async fn send(&self, message: Message) -> Result<()> {
        for handler in self.snapshot() {
            handler.handle(message.clone()).await?;
        }
        Ok(())
    }

    async fn send_batch(&self, messages: Vec<Message>) -> Result<()> {
        for handler in self.snapshot() {
            handler.handle_batch(messages.clone()).await?;
        }
        Ok(())
    }

    fn subscribe(&self, handler: Arc<dyn MessageHandler>) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.handlers.write().insert(id, handler);
        SubscriptionId(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.handlers.write().remove(&id.0).is_some()
    }
}
