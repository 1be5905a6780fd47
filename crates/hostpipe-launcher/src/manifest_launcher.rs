use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use hostpipe_channel::HostChannel;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{LaunchError, Result};
use crate::launcher::Launcher;
use crate::manifest::HostManifest;
use crate::name::is_valid_host_name;

/// Environment variable holding manifest search directories (platform path-list syntax).
pub const MANIFEST_DIRS_ENV: &str = "HOSTPIPE_MANIFEST_DIRS";

/// Where [`ManifestLauncher`] looks for manifests.
#[derive(Debug, Clone, Default)]
pub struct LauncherConfig {
    /// Directories searched in order; the first `<name>.json` found wins.
    pub search_dirs: Vec<PathBuf>,
}

impl LauncherConfig {
    /// Search directories from [`MANIFEST_DIRS_ENV`], empty if unset.
    pub fn from_env() -> Self {
        let search_dirs = std::env::var_os(MANIFEST_DIRS_ENV)
            .map(|dirs| std::env::split_paths(&dirs).collect())
            .unwrap_or_default();
        Self { search_dirs }
    }
}

/// A manifest that passed every check and is ready to spawn.
#[derive(Debug, Clone)]
pub struct ResolvedHost {
    pub manifest: HostManifest,
    pub manifest_path: PathBuf,
    pub executable: PathBuf,
}

/// Launches hosts described by JSON manifests.
#[derive(Debug, Clone)]
pub struct ManifestLauncher {
    config: LauncherConfig,
}

impl ManifestLauncher {
    pub fn new(config: LauncherConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LauncherConfig {
        &self.config
    }

    /// Find and check the manifest for `host_name` without starting anything.
    pub async fn resolve(&self, origin: &str, host_name: &str) -> Result<ResolvedHost> {
        let resolved = self.load(host_name).await?;
        if !resolved.manifest.allows_origin(origin) {
            return Err(LaunchError::Forbidden {
                name: host_name.to_string(),
                origin: origin.to_string(),
            });
        }
        Ok(resolved)
    }

    /// Like [`resolve`](Self::resolve), but without the origin check.
    pub async fn load(&self, host_name: &str) -> Result<ResolvedHost> {
        if !is_valid_host_name(host_name) {
            return Err(LaunchError::InvalidName {
                name: host_name.to_string(),
            });
        }

        let (manifest_path, bytes) = self.find_manifest(host_name).await?;
        let manifest = HostManifest::parse(&bytes, host_name).map_err(|reason| {
            LaunchError::InvalidManifest {
                path: manifest_path.clone(),
                reason,
            }
        })?;

        let manifest_dir = manifest_path.parent().unwrap_or_else(|| Path::new("."));
        let executable = manifest.resolve_path(manifest_dir);
        Ok(ResolvedHost {
            manifest,
            manifest_path,
            executable,
        })
    }

    async fn find_manifest(&self, host_name: &str) -> Result<(PathBuf, Vec<u8>)> {
        let file_name = format!("{host_name}.json");
        for dir in &self.config.search_dirs {
            let path = dir.join(&file_name);
            match tokio::fs::read(&path).await {
                Ok(bytes) => {
                    debug!(?path, "found native host manifest");
                    return Ok((path, bytes));
                }
                Err(err) if err.kind() == ErrorKind::NotFound => continue,
                Err(err) => {
                    return Err(LaunchError::InvalidManifest {
                        path,
                        reason: err.to_string(),
                    })
                }
            }
        }
        Err(LaunchError::NotFound {
            name: host_name.to_string(),
        })
    }

    fn spawn(resolved: &ResolvedHost, origin: &str) -> Result<HostChannel> {
        let failed = |source: std::io::Error| LaunchError::FailedToStart {
            path: resolved.executable.clone(),
            source,
        };
        // The host runs from its own directory, so the program path must not be relative.
        let path = std::path::absolute(&resolved.executable).map_err(failed)?;

        let mut command = Command::new(&path);
        command
            .arg(origin)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            command.current_dir(dir);
        }

        let child = command.spawn().map_err(failed)?;
        let channel = HostChannel::from_child(child)
            .map_err(|err| failed(std::io::Error::other(err.to_string())))?;
        info!(
            host = %resolved.manifest.name,
            pid = ?channel.process_id(),
            "native host started"
        );
        Ok(channel)
    }
}

impl Launcher for ManifestLauncher {
    async fn launch(&self, origin: &str, host_name: &str) -> Result<HostChannel> {
        let resolved = self.resolve(origin, host_name).await.inspect_err(|err| {
            warn!(host = host_name, outcome = %err.result(), error = %err, "native host launch refused");
        })?;
        Self::spawn(&resolved, origin).inspect_err(|err| {
            warn!(host = host_name, error = %err, "native host failed to start");
        })
    }
}
