/// Errors that can occur while converting messages to/from the control buffer.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The serialized message does not fit in the control buffer.
    ///
    /// A payload of exactly `capacity` bytes is rejected too: the driver
    /// needs at least one trailing NUL to delimit the content.
    #[error("payload too large ({size} bytes, buffer capacity {capacity})")]
    PayloadTooLarge { size: usize, capacity: usize },

    /// The buffer held no content before the zero padding.
    #[error("control buffer is empty")]
    Empty,

    /// The buffer content was not valid JSON for the expected message shape.
    #[error("malformed control message: {0}")]
    Malformed(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CodecError>;
