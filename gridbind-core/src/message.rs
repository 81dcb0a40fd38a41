//! Local message model and the transport envelope.
//!
//! A [`Message`] is what flows through the local channels: an opaque payload
//! plus optional string headers. A [`MessageEnvelope`] wraps a message with
//! the transport metadata needed to cross a process boundary through the
//! grid, and round-trips through `bincode`.

use crate::types::{PartitionId, Timestamp};
use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(Uuid);

impl MessageId {
    /// Generate a new unique message ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a message ID from a UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Message exchanged over a local channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message payload (zero-copy)
    pub payload: Bytes,

    /// Optional message headers
    pub headers: Option<HashMap<String, String>>,
}

impl Message {
    /// Create a new message with the given payload and no headers.
    #[must_use]
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self { payload: payload.into(), headers: None }
    }

    /// Create a message builder for more complex construction.
    #[must_use]
    pub fn builder() -> MessageBuilder {
        MessageBuilder::default()
    }

    /// Get the payload size in bytes.
    #[must_use]
    pub fn payload_size(&self) -> usize {
        self.payload.len()
    }

    /// Check if the message has headers.
    #[must_use]
    pub fn has_headers(&self) -> bool {
        self.headers.is_some()
    }

    /// Get a header value by key.
    #[must_use]
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.as_ref()?.get(key).map(String::as_str)
    }

    /// Add or update a header.
    pub fn set_header(&mut self, key: String, value: String) {
        self.headers.get_or_insert_with(HashMap::new).insert(key, value);
    }

    /// Remove a header.
    pub fn remove_header(&mut self, key: &str) -> Option<String> {
        self.headers.as_mut()?.remove(key)
    }
}

/// Builder for constructing messages with various options.
#[derive(Debug, Default)]
pub struct MessageBuilder {
    payload: Option<Bytes>,
    headers: Option<HashMap<String, String>>,
}

impl MessageBuilder {
    /// Set the message payload.
    #[must_use]
    pub fn payload(mut self, payload: impl Into<Bytes>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Add a header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Add multiple headers.
    #[must_use]
    pub fn headers(mut self, headers: HashMap<String, String>) -> Self {
        match self.headers {
            Some(ref mut existing) => existing.extend(headers),
            None => self.headers = Some(headers),
        }
        self
    }

    /// Build the message. A missing payload yields an empty one.
    #[must_use]
    pub fn build(self) -> Message {
        Message {
            payload: self.payload.unwrap_or_else(Bytes::new),
            headers: self.headers,
        }
    }
}

/// Transport envelope wrapping a [`Message`] for the grid wire.
///
/// Carries the resolved partition and, when partitioning is enabled, the
/// extracted partition key, so a consumer can observe how the message was
/// routed. Payload and headers survive the encode/decode round trip intact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEnvelope {
    /// Unique envelope identifier
    pub id: MessageId,

    /// The wrapped local message
    pub message: Message,

    /// Envelope creation timestamp
    pub timestamp: Timestamp,

    /// Partition the message was routed to
    pub partition: PartitionId,

    /// Extracted partition key, when partitioning was enabled
    pub partition_key: Option<Vec<u8>>,
}

impl MessageEnvelope {
    /// Wrap a local message for transport.
    #[must_use]
    pub fn wrap(message: Message, partition: PartitionId, partition_key: Option<Vec<u8>>) -> Self {
        Self {
            id: MessageId::new(),
            message,
            timestamp: Utc::now(),
            partition,
            partition_key,
        }
    }

    /// Unwrap the envelope back into the local message.
    #[must_use]
    pub fn into_message(self) -> Message {
        self.message
    }

    /// Encode the envelope into the grid wire format.
    ///
    /// # Errors
    /// Returns a serialization error if encoding fails.
    pub fn encode(&self) -> crate::Result<Bytes> {
        let encoded = bincode::serialize(self)?;
        Ok(Bytes::from(encoded))
    }

    /// Decode an envelope from the grid wire format.
    ///
    /// # Errors
    /// Returns a serialization error if the bytes are not a valid envelope.
    pub fn decode(bytes: &[u8]) -> crate::Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_creation() {
        let message = Message::new("test payload");

        assert_eq!(message.payload, Bytes::from("test payload"));
        assert_eq!(message.payload_size(), 12);
        assert!(message.headers.is_none());
    }

    #[test]
    fn test_message_builder() {
        let message = Message::builder()
            .payload("test payload")
            .header("content-type", "application/json")
            .build();

        assert_eq!(message.payload, Bytes::from("test payload"));
        assert_eq!(message.header("content-type"), Some("application/json"));
    }

    #[test]
    fn test_message_headers() {
        let mut message = Message::new("data");

        assert!(!message.has_headers());
        assert!(message.header("key").is_none());

        message.set_header("key1".to_string(), "value1".to_string());
        message.set_header("key2".to_string(), "value2".to_string());

        assert!(message.has_headers());
        assert_eq!(message.header("key1"), Some("value1"));
        assert_eq!(message.header("key2"), Some("value2"));

        let removed = message.remove_header("key1");
        assert_eq!(removed, Some("value1".to_string()));
        assert!(message.header("key1").is_none());
    }

    #[test]
    fn test_envelope_round_trip() {
        let mut message = Message::new("hello world");
        message.set_header("origin".to_string(), "producer-1".to_string());

        let envelope = MessageEnvelope::wrap(
            message.clone(),
            PartitionId::new(1),
            Some(b"hello world".to_vec()),
        );

        let encoded = envelope.encode().unwrap();
        let decoded = MessageEnvelope::decode(&encoded).unwrap();

        assert_eq!(decoded, envelope);
        assert_eq!(decoded.partition, PartitionId::new(1));

        let unwrapped = decoded.into_message();
        assert_eq!(unwrapped.payload, message.payload);
        assert_eq!(unwrapped.header("origin"), Some("producer-1"));
    }

    #[test]
    fn test_envelope_decode_rejects_garbage() {
        assert!(MessageEnvelope::decode(b"not an envelope").is_err());
    }
}
