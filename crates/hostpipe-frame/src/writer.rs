use std::io::{self, ErrorKind, Write};

use bytes::BytesMut;

use crate::codec::{encode_frame, FrameConfig};
use crate::error::{FrameError, Result};

/// Blocking message writer for the host side of the pipe (its stdout).
///
/// Each message is framed into one buffer, written in full and flushed, so a
/// reader never waits on a frame sitting in a userspace buffer. Messages over
/// the configured maximum are refused before anything is written: the other
/// side would drop the channel on seeing the header anyway.
pub struct FrameWriter<W> {
    stream: W,
    frame: BytesMut,
    config: FrameConfig,
}

impl<W: Write> FrameWriter<W> {
    pub fn new(stream: W) -> Self {
        Self::with_config(stream, FrameConfig::default())
    }

    pub fn with_config(stream: W, config: FrameConfig) -> Self {
        Self {
            stream,
            frame: BytesMut::new(),
            config,
        }
    }

    /// Frame `message`, write it and flush.
    ///
    /// A reader that went away surfaces as [`FrameError::ConnectionClosed`].
    pub fn write_message(&mut self, message: &[u8]) -> Result<()> {
        let max = self.config.max_message_size;
        if message.len() > max {
            return Err(FrameError::PayloadTooLarge {
                size: message.len(),
                max,
            });
        }

        self.frame.clear();
        encode_frame(message, &mut self.frame)?;
        self.stream.write_all(&self.frame).map_err(disconnected)?;
        self.stream.flush().map_err(disconnected)
    }

    pub fn get_ref(&self) -> &W {
        &self.stream
    }

    pub fn into_inner(self) -> W {
        self.stream
    }
}

fn disconnected(err: io::Error) -> FrameError {
    match err.kind() {
        ErrorKind::BrokenPipe | ErrorKind::WriteZero => FrameError::ConnectionClosed,
        _ => FrameError::Io(err),
    }
}
