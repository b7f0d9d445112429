use std::sync::Arc;

use bytes::Bytes;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{DecodeError, EncodeError};

/// The (topic, payload) unit transmitted over the transport.
///
/// The topic is set once at construction and never mutated; the payload is
/// exactly one serialized application message, opaque to everything between
/// `encode` and `decode`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    topic: Arc<str>,
    payload: Bytes,
}

impl Envelope {
    /// Builds an envelope from an already-serialized payload.
    pub fn from_parts(
        topic: impl Into<Arc<str>>,
        payload: impl Into<Bytes>,
    ) -> Result<Self, EncodeError> {
        let topic = topic.into();
        if topic.is_empty() {
            return Err(EncodeError::EmptyTopic);
        }
        Ok(Self {
            topic,
            payload: payload.into(),
        })
    }

    /// Serializes `message` and tags it with `topic`.
    pub fn encode<T: Serialize>(
        topic: impl Into<Arc<str>>,
        message: &T,
    ) -> Result<Self, EncodeError> {
        let payload = serde_json::to_vec(message)?;
        Self::from_parts(topic, payload)
    }

    /// Deserializes the payload into the expected message shape.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, DecodeError> {
        Ok(serde_json::from_slice(&self.payload)?)
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Invariant: callers have already checked that `topic` is non-empty.
    pub(crate) fn from_validated(topic: Arc<str>, payload: Bytes) -> Self {
        Self { topic, payload }
    }
}
