use std::fmt;
use std::io;

use hostpipe_frame::FrameError;
use hostpipe_host::{CloseReason, HostError};
use hostpipe_launcher::{LaunchError, LaunchResult};

// Exit codes follow sysexits(3) where one fits.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const NOT_FOUND: i32 = 66;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;
pub const INTERRUPTED: i32 = 130;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::BrokenPipe | io::ErrorKind::ConnectionReset => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::PayloadTooLarge { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        FrameError::ConnectionClosed => CliError::new(TRANSPORT_ERROR, format!("{context}: {err}")),
    }
}

fn launch_result_code(result: LaunchResult) -> i32 {
    match result {
        LaunchResult::Success => SUCCESS,
        LaunchResult::InvalidName => USAGE,
        LaunchResult::NotFound => NOT_FOUND,
        LaunchResult::Forbidden => PERMISSION_DENIED,
        LaunchResult::FailedToStart => FAILURE,
    }
}

pub fn launch_error(context: &str, err: LaunchError) -> CliError {
    CliError::new(launch_result_code(err.result()), format!("{context}: {err}"))
}

pub fn host_error(context: &str, err: HostError) -> CliError {
    match err {
        HostError::Closed => CliError::new(TRANSPORT_ERROR, format!("{context}: {err}")),
        HostError::Frame(err) => frame_error(context, err),
        HostError::Json(err) => CliError::new(DATA_INVALID, format!("{context}: {err}")),
    }
}

/// Error for a channel that closed before the command got what it wanted.
pub fn close_error(reason: CloseReason) -> CliError {
    let code = match reason {
        CloseReason::InvalidName => USAGE,
        CloseReason::NotFound => NOT_FOUND,
        CloseReason::Forbidden => PERMISSION_DENIED,
        CloseReason::FailedToStart | CloseReason::ClosedByClient => FAILURE,
        CloseReason::HostExited | CloseReason::IoError => TRANSPORT_ERROR,
        CloseReason::MessageTooLarge => DATA_INVALID,
    };
    CliError::new(code, reason.message())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_outcomes_have_distinct_codes() {
        let codes = [
            close_error(CloseReason::InvalidName).code,
            close_error(CloseReason::NotFound).code,
            close_error(CloseReason::Forbidden).code,
            close_error(CloseReason::FailedToStart).code,
        ];
        for (i, code) in codes.iter().enumerate() {
            assert!(!codes[i + 1..].contains(code), "duplicate exit code {code}");
        }
    }

    #[test]
    fn launch_error_and_close_reason_agree() {
        let err = LaunchError::Forbidden {
            name: "com.example.h".to_string(),
            origin: "app://x/".to_string(),
        };
        assert_eq!(
            launch_error("resolve failed", err).code,
            close_error(CloseReason::Forbidden).code
        );
    }

    #[test]
    fn oversized_frames_are_data_errors() {
        let err = FrameError::PayloadTooLarge { size: 10, max: 1 };
        assert_eq!(frame_error("read failed", err).code, DATA_INVALID);
    }
}
