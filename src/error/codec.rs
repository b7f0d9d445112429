use thiserror::Error;

/// Errors raised while building an envelope.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("topic must not be empty")]
    EmptyTopic,

    #[error("payload serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("frame too large ({got} > {max})")]
    FrameTooLarge { got: usize, max: usize },
}

/// Errors raised while decoding an envelope or its wire form.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("payload deserialization failed: {0}")]
    Deserialize(#[from] serde_json::Error),

    #[error("topic frame is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("topic frame is empty")]
    EmptyTopic,

    #[error("frame too large ({got} > {max})")]
    FrameTooLarge { got: usize, max: usize },
}
