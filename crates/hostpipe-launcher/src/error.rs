use std::path::PathBuf;

use crate::launcher::LaunchResult;

/// Why a native host could not be launched.
///
/// Every variant collapses onto one of the four failure [`LaunchResult`]s; the
/// extra detail is for logs only.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    /// The host name is syntactically invalid.
    #[error("invalid native host name {name:?}")]
    InvalidName { name: String },

    /// No manifest for the host exists in any search directory.
    #[error("no manifest found for native host {name:?}")]
    NotFound { name: String },

    /// A manifest exists but cannot be used.
    #[error("invalid manifest {path}: {reason}")]
    InvalidManifest { path: PathBuf, reason: String },

    /// The manifest does not list the caller's origin.
    #[error("origin {origin:?} may not use native host {name:?}")]
    Forbidden { name: String, origin: String },

    /// Spawning the host executable (or wiring its pipes) failed.
    #[error("failed to start native host {path}: {source}")]
    FailedToStart {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl LaunchError {
    /// The launch outcome this error reports.
    pub fn result(&self) -> LaunchResult {
        match self {
            Self::InvalidName { .. } => LaunchResult::InvalidName,
            Self::NotFound { .. } | Self::InvalidManifest { .. } => LaunchResult::NotFound,
            Self::Forbidden { .. } => LaunchResult::Forbidden,
            Self::FailedToStart { .. } => LaunchResult::FailedToStart,
        }
    }
}

pub type Result<T> = std::result::Result<T, LaunchError>;
