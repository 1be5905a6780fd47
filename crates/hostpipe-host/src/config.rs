use std::time::Duration;

use hostpipe_channel::DEFAULT_TERMINATION_GRACE;
use hostpipe_frame::MAX_MESSAGE_SIZE;

/// Tunables for a [`NativeMessageHost`](crate::NativeMessageHost).
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Size of the scratch buffer each read fills. Default: 4 KiB.
    pub read_buffer_size: usize,
    /// Largest message accepted from the host. Default: 1 MiB.
    pub max_message_size: usize,
    /// How long the host may take to exit after the channel closes before it
    /// is terminated. Default: 2s.
    pub termination_grace: Duration,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            read_buffer_size: 4096,
            max_message_size: MAX_MESSAGE_SIZE,
            termination_grace: DEFAULT_TERMINATION_GRACE,
        }
    }
}
