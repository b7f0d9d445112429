/// Envelope encoding/decoding: topic + payload framing.
pub mod codec;
/// Process configuration loading.
pub mod config;
/// Publisher and subscriber endpoints.
pub mod endpoint;
/// Common error types: codec, endpoint, run.
pub mod error;
/// Console logging via `tracing`.
pub mod logging;
/// Reference application payload.
pub mod message;
/// Run-loop composition: one publisher + N subscribers under one token.
pub mod orchestrator;
/// In-process transport: address registry, ports, prefix filtering.
pub mod transport;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// The two-frame wire unit.
pub use codec::Envelope;
/// Process settings loaded from defaults and environment.
pub use config::Settings;
/// Endpoint types and their default high-water-marks.
pub use endpoint::{Publisher, Subscriber, DEFAULT_RECEIVE_HWM, DEFAULT_SEND_HWM};
/// Operation errors.
pub use error::{
    BindError, ConnectError, DecodeError, EncodeError, RecvError, RunError, SendError,
    SubscribeError, TaskError,
};
/// Reference payload shape.
pub use message::TickMessage;
/// Orchestration entry point.
pub use orchestrator::{run, RunOptions, RunReport};
