/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A frame declared (or a caller tried to send) more bytes than allowed.
    #[error("message too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended, possibly in the middle of a frame.
    #[error("connection closed")]
    ConnectionClosed,
}

impl FrameError {
    /// Whether the error means the declared frame length was over the limit.
    pub fn is_oversized(&self) -> bool {
        matches!(self, Self::PayloadTooLarge { .. })
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
