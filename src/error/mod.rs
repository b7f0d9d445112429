pub mod codec;
pub mod endpoint;
pub mod run;

pub use codec::{DecodeError, EncodeError};
pub use endpoint::{BindError, ConnectError, RecvError, SendError, SubscribeError};
pub use run::{RunError, TaskError};
