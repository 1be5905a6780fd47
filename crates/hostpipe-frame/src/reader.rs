use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};
use tracing::debug;

use crate::codec::{decode_frame, FrameConfig};
use crate::error::{FrameError, Result};

const READ_CHUNK_SIZE: usize = 4 * 1024;

/// Blocking message reader for the host side of the pipe.
///
/// A native host wraps its stdin in one of these:
///
/// ```no_run
/// use hostpipe_frame::FrameReader;
///
/// for message in FrameReader::new(std::io::stdin().lock()) {
///     let message = message?;
///     eprintln!("got {} bytes", message.len());
/// }
/// # Ok::<(), hostpipe_frame::FrameError>(())
/// ```
///
/// Iteration ends at a clean EOF. Stop at the first error: the stream is not
/// resynchronized after one.
pub struct FrameReader<R> {
    stream: R,
    pending: BytesMut,
    config: FrameConfig,
}

impl<R: Read> FrameReader<R> {
    pub fn new(stream: R) -> Self {
        Self::with_config(stream, FrameConfig::default())
    }

    pub fn with_config(stream: R, config: FrameConfig) -> Self {
        Self {
            stream,
            pending: BytesMut::new(),
            config,
        }
    }

    /// Block until the next complete message arrives.
    ///
    /// `Ok(None)` means the writer closed the stream between two messages.
    /// EOF in the middle of a message is [`FrameError::ConnectionClosed`].
    pub fn read_message(&mut self) -> Result<Option<Bytes>> {
        loop {
            if let Some(message) = decode_frame(&mut self.pending, self.config.max_message_size)? {
                return Ok(Some(message));
            }
            if self.fill()? == 0 {
                if self.pending.is_empty() {
                    return Ok(None);
                }
                debug!(buffered = self.pending.len(), "stream ended inside a message");
                return Err(FrameError::ConnectionClosed);
            }
        }
    }

    /// Append one read's worth of bytes to `pending`; 0 at EOF.
    fn fill(&mut self) -> Result<usize> {
        let filled = self.pending.len();
        self.pending.resize(filled + READ_CHUNK_SIZE, 0);
        let read = loop {
            match self.stream.read(&mut self.pending[filled..]) {
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                other => break other,
            }
        };
        self.pending.truncate(filled + read.as_ref().copied().unwrap_or(0));
        read.map_err(FrameError::Io)
    }

    /// Bytes read but not yet part of a returned message.
    pub fn buffered(&self) -> usize {
        self.pending.len()
    }

    pub fn get_ref(&self) -> &R {
        &self.stream
    }

    pub fn into_inner(self) -> R {
        self.stream
    }
}

impl<R: Read> Iterator for FrameReader<R> {
    type Item = Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_message().transpose()
    }
}
