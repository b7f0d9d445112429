//! In-process transport.
//!
//! This module plays the socket library's role: reliable framed delivery,
//! address binding/connection and topic-prefix filtering, all inside the
//! process:
//!
//! - `hub`: one `Hub` per address in a process-wide registry; the publisher
//!   side claims the address, subscriber side attaches ports with bounded
//!   buffers.
//! - `intern` (crate-private): `Arc<str>` pool for address and filter names.
//!
//! Addresses are opaque strings; `inproc://name` and `tcp://host:port` route
//! through the same registry.

pub mod hub;
mod intern;

pub use hub::{lookup, Hub};
pub(crate) use intern::intern_name;
