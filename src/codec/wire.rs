use std::sync::Arc;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::Envelope;
use crate::error::{DecodeError, EncodeError};

/// Maximum topic frame length (64kb).
pub const MAX_TOPIC_LENGTH: usize = 64 * 1024;
/// Maximum payload frame length (16mb).
pub const MAX_PAYLOAD_LENGTH: usize = 16 * 1024 * 1024;

/// Encodes an envelope as its two consecutive length-prefixed frames:
/// `u32-be` topic length + topic bytes, `u32-be` payload length + payload
/// bytes.
pub fn encode_wire(envelope: &Envelope) -> Result<Bytes, EncodeError> {
    let topic = envelope.topic().as_bytes();
    if topic.len() > MAX_TOPIC_LENGTH {
        return Err(EncodeError::FrameTooLarge {
            got: topic.len(),
            max: MAX_TOPIC_LENGTH,
        });
    }
    let payload = envelope.payload();
    if payload.len() > MAX_PAYLOAD_LENGTH {
        return Err(EncodeError::FrameTooLarge {
            got: payload.len(),
            max: MAX_PAYLOAD_LENGTH,
        });
    }

    let mut out = BytesMut::with_capacity(8 + topic.len() + payload.len());
    out.put_u32(topic.len() as u32);
    out.put_slice(topic);
    out.put_u32(payload.len() as u32);
    out.put_slice(payload);
    Ok(out.freeze())
}

/// Decodes one envelope from the front of `buf`.
///
/// Returns `Ok(None)` when `buf` holds only a partial envelope; `buf` is
/// advanced only after a full envelope was parsed, so the caller can keep
/// appending bytes and retry.
pub fn decode_wire(buf: &mut Bytes) -> Result<Option<Envelope>, DecodeError> {
    let mut peek = buf.clone();

    // frame 1: topic
    if peek.remaining() < 4 {
        return Ok(None);
    }
    let topic_len = peek.get_u32() as usize;
    if topic_len > MAX_TOPIC_LENGTH {
        return Err(DecodeError::FrameTooLarge {
            got: topic_len,
            max: MAX_TOPIC_LENGTH,
        });
    }
    if peek.remaining() < topic_len {
        return Ok(None);
    }
    let topic_bytes = peek.copy_to_bytes(topic_len);

    // frame 2: payload
    if peek.remaining() < 4 {
        return Ok(None);
    }
    let payload_len = peek.get_u32() as usize;
    if payload_len > MAX_PAYLOAD_LENGTH {
        return Err(DecodeError::FrameTooLarge {
            got: payload_len,
            max: MAX_PAYLOAD_LENGTH,
        });
    }
    if peek.remaining() < payload_len {
        return Ok(None);
    }
    let payload = peek.copy_to_bytes(payload_len);

    let topic = std::str::from_utf8(&topic_bytes)?;
    if topic.is_empty() {
        return Err(DecodeError::EmptyTopic);
    }
    let topic: Arc<str> = Arc::from(topic);

    *buf = peek;
    Ok(Some(Envelope::from_validated(topic, payload)))
}
