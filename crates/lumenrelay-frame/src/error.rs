/// Errors that can occur while reading, splitting or writing frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A single read pushed the buffer past the frame boundary.
    #[error("unexpected data: received {received} bytes, frame is {expected}")]
    Oversized { received: usize, expected: usize },

    /// A frame or payload did not have the required length.
    #[error("frame length mismatch (expected {expected} bytes, got {actual})")]
    LengthMismatch { expected: usize, actual: usize },

    /// The configured frame length cannot describe any frame.
    #[error("frame length must be greater than zero")]
    InvalidFrameLength,

    /// The stream stopped accepting bytes part way through a frame.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
