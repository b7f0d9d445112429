use thiserror::Error;

use super::{DecodeError, EncodeError};

/// Errors raised by `Publisher::bind`.
#[derive(Debug, Error)]
pub enum BindError {
    #[error("address must not be empty")]
    InvalidAddress,

    #[error("address {0} is already bound by another publisher")]
    AddressInUse(String),

    #[error("endpoint is already bound to {0}")]
    AlreadyBound(String),

    #[error("endpoint is closed")]
    Closed,
}

/// Errors raised by `Subscriber::connect`.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("address must not be empty")]
    InvalidAddress,

    #[error("endpoint is already connected to {0}")]
    AlreadyConnected(String),

    #[error("endpoint is closed")]
    Closed,
}

/// Errors raised by `Publisher::send`.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("endpoint is not bound")]
    NotBound,

    #[error("endpoint is closed")]
    Closed,

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Errors raised by `Subscriber::subscribe`.
#[derive(Debug, Error)]
pub enum SubscribeError {
    #[error("endpoint is not connected")]
    NotConnected,

    #[error("endpoint is closed")]
    Closed,

    #[error("topic filter must not be empty")]
    EmptyFilter,
}

/// Errors raised by `Subscriber::try_receive`.
///
/// A timeout is not an error (`Ok(None)`), and neither is lag: a receiver
/// that fell behind its high-water-mark silently loses the oldest backlog.
#[derive(Debug, Error)]
pub enum RecvError {
    #[error("endpoint is not connected")]
    NotConnected,

    #[error("endpoint is closed")]
    Closed,

    #[error(transparent)]
    Decode(#[from] DecodeError),
}
