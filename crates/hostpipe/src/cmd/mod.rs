use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use hostpipe_launcher::LauncherConfig;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod echo;
pub mod manifest;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Launch a native host, send it messages and print its replies.
    Send(SendArgs),
    /// Run as a native host that echoes every message back.
    Echo(EchoArgs),
    /// Look up a host manifest without launching anything.
    Manifest(ManifestArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Send(args) => send::run(args, format),
        Command::Echo(args) => echo::run(args),
        Command::Manifest(args) => manifest::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Native host name, e.g. com.example.echo.
    pub host_name: String,
    /// Origin to launch the host for; must be listed in its manifest.
    #[arg(long)]
    pub origin: String,
    /// Manifest directory to search (repeatable). Default: $HOSTPIPE_MANIFEST_DIRS.
    #[arg(long = "manifest-dir", value_name = "DIR")]
    pub manifest_dirs: Vec<PathBuf>,
    /// JSON message to send (repeatable, sent in order).
    #[arg(long, value_name = "JSON")]
    pub json: Vec<String>,
    /// Number of replies to wait for before closing.
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u64).range(1..))]
    pub wait: u64,
    /// Give up after this long (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct EchoArgs {
    /// Origin the host was launched for (passed by the launcher).
    pub origin: Option<String>,
    /// Reply with {"echo": <message>, "origin": <origin>} instead of the bare message.
    #[arg(long)]
    pub wrap: bool,
    /// Exit after echoing N messages.
    #[arg(long)]
    pub count: Option<u64>,
}

#[derive(Args, Debug)]
pub struct ManifestArgs {
    /// Native host name, e.g. com.example.echo.
    pub host_name: String,
    /// Also check that this origin may use the host.
    #[arg(long)]
    pub origin: Option<String>,
    /// Manifest directory to search (repeatable). Default: $HOSTPIPE_MANIFEST_DIRS.
    #[arg(long = "manifest-dir", value_name = "DIR")]
    pub manifest_dirs: Vec<PathBuf>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Explicit `--manifest-dir`s win over the environment.
pub(crate) fn launcher_config(manifest_dirs: &[PathBuf]) -> LauncherConfig {
    if manifest_dirs.is_empty() {
        LauncherConfig::from_env()
    } else {
        LauncherConfig {
            search_dirs: manifest_dirs.to_vec(),
        }
    }
}

pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = match input.strip_suffix("ms") {
        Some(number) => (number, true),
        None => (input.strip_suffix('s').unwrap_or(input), false),
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

pub(crate) fn runtime() -> CliResult<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| crate::exit::io_error("failed to start async runtime", err))
}
