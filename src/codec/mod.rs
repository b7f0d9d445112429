//! Envelope codec.
//!
//! The unit of transmission is a two-frame envelope: frame 1 carries the
//! topic as UTF-8 bytes, frame 2 carries the serialized payload. This module
//! provides:
//!
//! - `envelope`: the `Envelope` type and typed encode/decode through the
//!   `serde_json` serializer.
//! - `wire`: the length-prefixed byte form of the two frames, with size
//!   limits and incremental decoding.
//!
//! Everything here is stateless and safe to call from any number of tasks.

pub mod envelope;
pub mod wire;

pub use envelope::Envelope;
pub use wire::{decode_wire, encode_wire, MAX_PAYLOAD_LENGTH, MAX_TOPIC_LENGTH};
