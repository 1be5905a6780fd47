//! Launching native messaging hosts.
//!
//! The transport only depends on the [`Launcher`] trait: given an origin and
//! a logical host name, produce a [`HostChannel`](hostpipe_channel::HostChannel)
//! or one of four failure outcomes. [`ManifestLauncher`] is the stock
//! implementation: it looks up `<name>.json` manifests in a list of
//! directories, checks the caller's origin against `allowed_origins`, and
//! spawns the host with its stdin/stdout piped.

pub mod error;
pub mod launcher;
pub mod manifest;
pub mod manifest_launcher;
pub mod name;

pub use error::{LaunchError, Result};
pub use launcher::{LaunchResult, Launcher};
pub use manifest::{HostManifest, HostType};
pub use manifest_launcher::{LauncherConfig, ManifestLauncher, ResolvedHost, MANIFEST_DIRS_ENV};
pub use name::is_valid_host_name;
