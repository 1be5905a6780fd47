//! Message transport to a native messaging host.
//!
//! [`NativeMessageHost`] launches a host through a
//! [`Launcher`](hostpipe_launcher::Launcher), then exchanges length-prefixed
//! JSON messages with it until either side goes away. All protocol state
//! lives on one task; the application talks to it through a cloneable
//! [`HostHandle`] and hears back through its [`Client`].
//!
//! Every failure (launch refused, host exited, oversized message, I/O error)
//! ends in exactly one [`Client::channel_closed`] call. There are no retries
//! at this layer.

pub mod buffers;
pub mod client;
pub mod config;
pub mod error;
pub mod host;
pub mod reason;
pub mod state;

pub use buffers::{IncomingBuffer, OutgoingQueue};
pub use client::{channel_client, ChannelClient, Client, HostEvent, HostEvents};
pub use config::HostConfig;
pub use error::{HostError, Result};
pub use host::{HostHandle, NativeMessageHost};
pub use reason::CloseReason;
pub use state::HostState;
