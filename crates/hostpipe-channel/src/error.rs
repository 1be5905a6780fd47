/// Errors that can occur while setting up a host channel.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The child was spawned without the pipe we need.
    #[error("host process has no piped {0}")]
    MissingPipe(&'static str),

    /// An I/O error occurred while converting or registering the pipes.
    #[error("channel I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ChannelError>;
