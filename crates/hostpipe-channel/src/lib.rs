//! Duplex channel to a launched native host process.
//!
//! A [`HostChannel`] owns both ends of the pipe pair wired to the child's
//! stdin/stdout, plus (optionally) the [`HostProcess`] itself. How a read or
//! write is issued is a per-platform strategy:
//! - Unix pipes wait for readiness and then read/write without blocking
//! - everything else (generic tokio streams, Windows) issues the I/O directly
//!
//! Nothing above this crate needs to know which one is in use.

pub mod channel;
pub mod error;
pub mod process;

pub use channel::{ChannelReader, ChannelWriter, HostChannel, IoStrategy};
pub use error::{ChannelError, Result};
pub use process::{HostProcess, DEFAULT_TERMINATION_GRACE};
