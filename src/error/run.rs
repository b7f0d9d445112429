use thiserror::Error;
use tokio::task::JoinError;

use super::{BindError, ConnectError, RecvError, SendError, SubscribeError};

/// Any fatal error an endpoint task can die with.
///
/// Encode failures on send and decode failures on receive are handled inside
/// the loops (one bad message never kills a task); everything here ends the
/// whole run.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Bind(#[from] BindError),

    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Subscribe(#[from] SubscribeError),

    #[error(transparent)]
    Send(#[from] SendError),

    #[error(transparent)]
    Recv(#[from] RecvError),
}

/// Errors raised by `orchestrator::run`.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("no topics configured")]
    NoTopics,

    #[error("{subscribers} subscribers need at least {subscribers} topics (got {topics})")]
    NotEnoughTopics { subscribers: usize, topics: usize },

    #[error("endpoint task failed: {0}")]
    Task(#[from] TaskError),

    #[error("endpoint task panicked: {0}")]
    Join(#[from] JoinError),
}
