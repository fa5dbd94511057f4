/// Errors that can occur while decoding or encoding preview frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The buffer is shorter than the fixed header for its frame type.
    #[error("frame too short ({len} bytes, need at least {min})")]
    TooShort { len: usize, min: usize },

    /// The header declares more array data than the buffer holds.
    #[error("frame truncated (arrays end at byte {needed}, frame has {len})")]
    Truncated { needed: usize, len: usize },

    /// The message-type field is neither mesh nor error.
    #[error("unknown frame type {0}")]
    UnknownType(u32),

    /// The frame exceeds the configured maximum size.
    #[error("frame too large ({size} bytes, max {max})")]
    TooLarge { size: usize, max: usize },

    /// The mesh trailer is present but is not the expected JSON record.
    #[error("invalid mesh trailer: {0}")]
    InvalidTrailer(#[source] serde_json::Error),

    /// The error frame body is not the expected JSON record.
    #[error("invalid error frame payload: {0}")]
    InvalidErrorPayload(#[source] serde_json::Error),

    /// Arrays handed to the encoder do not describe a consistent mesh.
    #[error("inconsistent mesh: {0}")]
    InconsistentMesh(String),
}

pub type Result<T> = std::result::Result<T, FrameError>;
