//! Publisher and subscriber endpoints.
//!
//! Each endpoint owns exactly one transport resource and is driven by
//! exactly one task:
//!
//! - `publisher`: bind → send → close, with a bounded outbound queue.
//! - `subscriber`: connect → subscribe → timeout-bounded receive → close.
//!
//! Both `close` paths are idempotent, and both endpoints close themselves
//! on `Drop`, so no address or port leaks on an early loop exit.

pub mod publisher;
pub mod subscriber;

pub use publisher::{Publisher, DEFAULT_SEND_HWM};
pub use subscriber::{Subscriber, DEFAULT_RECEIVE_HWM};
