use std::fmt;
use std::future::Future;
use std::sync::Arc;

use hostpipe_channel::HostChannel;

use crate::error::Result;

/// Outcome of a launch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LaunchResult {
    Success,
    InvalidName,
    NotFound,
    Forbidden,
    FailedToStart,
}

impl LaunchResult {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::InvalidName => "invalid_name",
            Self::NotFound => "not_found",
            Self::Forbidden => "forbidden",
            Self::FailedToStart => "failed_to_start",
        }
    }
}

impl fmt::Display for LaunchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolves a logical host name to a running process and hands back its channel.
///
/// `origin` identifies the caller the host is launched for; implementations
/// decide whether that caller is allowed to use `host_name`. The returned
/// channel is owned by the caller from then on.
pub trait Launcher: Send + Sync + 'static {
    fn launch(
        &self,
        origin: &str,
        host_name: &str,
    ) -> impl Future<Output = Result<HostChannel>> + Send;
}

impl<L: Launcher> Launcher for Arc<L> {
    fn launch(
        &self,
        origin: &str,
        host_name: &str,
    ) -> impl Future<Output = Result<HostChannel>> + Send {
        (**self).launch(origin, host_name)
    }
}
