/// Errors surfaced to callers of [`HostHandle`](crate::HostHandle).
///
/// Transport failures are not reported here; they close the channel and are
/// reported once through [`Client::channel_closed`](crate::Client::channel_closed).
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// The channel has been closed and the host task is gone.
    #[error("native messaging channel is closed")]
    Closed,

    /// The message could not be framed.
    #[error("frame error: {0}")]
    Frame(#[from] hostpipe_frame::FrameError),

    /// The message could not be serialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HostError>;
