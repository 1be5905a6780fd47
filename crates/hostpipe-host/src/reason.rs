use std::fmt;

use hostpipe_launcher::LaunchResult;

/// Why a native messaging channel was closed.
///
/// Each reason carries a fixed diagnostic string (see [`CloseReason::message`])
/// that is safe to show to whoever asked for the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloseReason {
    /// The launcher rejected the host name.
    InvalidName,
    /// No usable manifest for the host.
    NotFound,
    /// The caller's origin is not allowed to use the host.
    Forbidden,
    /// The host executable could not be started.
    FailedToStart,
    /// The host closed its end of the pipe (EOF or reset).
    HostExited,
    /// The host declared a message larger than the limit.
    MessageTooLarge,
    /// Reading from or writing to the host failed.
    IoError,
    /// The owner closed the channel or dropped every handle.
    ClosedByClient,
}

impl CloseReason {
    /// The fixed diagnostic string for this reason.
    pub fn message(self) -> &'static str {
        match self {
            Self::InvalidName => "Invalid native messaging host name specified.",
            Self::NotFound => "Specified native messaging host not found.",
            Self::Forbidden => "Access to the specified native messaging host is forbidden.",
            Self::FailedToStart => "Failed to start native messaging host.",
            Self::HostExited => "Native host has exited.",
            Self::MessageTooLarge | Self::IoError => {
                "Error when communicating with the native messaging host."
            }
            Self::ClosedByClient => "Native messaging channel closed.",
        }
    }

    /// Map a failed launch outcome to its close reason. `None` for success.
    pub fn from_launch(result: LaunchResult) -> Option<Self> {
        match result {
            LaunchResult::Success => None,
            LaunchResult::InvalidName => Some(Self::InvalidName),
            LaunchResult::NotFound => Some(Self::NotFound),
            LaunchResult::Forbidden => Some(Self::Forbidden),
            LaunchResult::FailedToStart => Some(Self::FailedToStart),
        }
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}
