use std::fmt;
use std::io::{self, ErrorKind};
use std::pin::Pin;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
#[cfg(unix)]
use tokio::net::unix::pipe;
use tokio::process::Child;
use tracing::debug;

use crate::error::{ChannelError, Result};
use crate::process::HostProcess;

/// How reads and writes are issued on a channel half.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoStrategy {
    /// Wait for the pipe to become ready, then do a non-blocking read/write.
    WaitReady,
    /// Hand the read/write straight to the underlying async stream.
    Direct,
}

/// The read half of a host channel.
pub struct ChannelReader {
    inner: ReaderInner,
}

enum ReaderInner {
    #[cfg(unix)]
    Pipe(pipe::Receiver),
    Stream(Pin<Box<dyn AsyncRead + Send>>),
}

impl ChannelReader {
    /// Wrap any async reader; reads are issued directly.
    pub fn from_stream(reader: impl AsyncRead + Send + 'static) -> Self {
        Self {
            inner: ReaderInner::Stream(Box::pin(reader)),
        }
    }

    /// Wrap the read end of a Unix pipe; reads wait for readiness first.
    #[cfg(unix)]
    pub fn from_pipe(receiver: pipe::Receiver) -> Self {
        Self {
            inner: ReaderInner::Pipe(receiver),
        }
    }

    pub fn strategy(&self) -> IoStrategy {
        match &self.inner {
            #[cfg(unix)]
            ReaderInner::Pipe(_) => IoStrategy::WaitReady,
            ReaderInner::Stream(_) => IoStrategy::Direct,
        }
    }

    /// Read whatever is available into `buf`.
    ///
    /// Returns `Ok(0)` at end of stream. Cancel safe: if the future is dropped
    /// before completing, no bytes have been taken off the channel.
    pub async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.inner {
            #[cfg(unix)]
            ReaderInner::Pipe(receiver) => loop {
                receiver.readable().await?;
                match receiver.try_read(buf) {
                    Ok(n) => return Ok(n),
                    Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                    Err(err) => return Err(err),
                }
            },
            ReaderInner::Stream(stream) => stream.read(buf).await,
        }
    }
}

/// The write half of a host channel.
pub struct ChannelWriter {
    inner: WriterInner,
    unflushed: bool,
}

enum WriterInner {
    #[cfg(unix)]
    Pipe(pipe::Sender),
    Stream(Pin<Box<dyn AsyncWrite + Send>>),
}

impl ChannelWriter {
    /// Wrap any async writer; writes are issued directly.
    pub fn from_stream(writer: impl AsyncWrite + Send + 'static) -> Self {
        Self {
            inner: WriterInner::Stream(Box::pin(writer)),
            unflushed: false,
        }
    }

    /// Wrap the write end of a Unix pipe; writes wait for writability first.
    #[cfg(unix)]
    pub fn from_pipe(sender: pipe::Sender) -> Self {
        Self {
            inner: WriterInner::Pipe(sender),
            unflushed: false,
        }
    }

    pub fn strategy(&self) -> IoStrategy {
        match &self.inner {
            #[cfg(unix)]
            WriterInner::Pipe(_) => IoStrategy::WaitReady,
            WriterInner::Stream(_) => IoStrategy::Direct,
        }
    }

    /// Write a prefix of `buf`, returning how many bytes were accepted.
    ///
    /// Cancel safe: a dropped future has written nothing. Bytes accepted by a
    /// buffering stream may sit there until [`flush`](Self::flush) is called.
    pub async fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.inner {
            #[cfg(unix)]
            WriterInner::Pipe(sender) => loop {
                sender.writable().await?;
                match sender.try_write(buf) {
                    Ok(n) => return Ok(n),
                    Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                    Err(err) => return Err(err),
                }
            },
            WriterInner::Stream(stream) => {
                let n = stream.write(buf).await?;
                self.unflushed |= n > 0;
                Ok(n)
            }
        }
    }

    /// Whether bytes were written since the last completed flush.
    pub fn needs_flush(&self) -> bool {
        self.unflushed
    }

    /// Push anything a buffering stream is holding out to the host.
    ///
    /// Cancel safe: a dropped flush loses nothing and can simply be retried.
    pub async fn flush(&mut self) -> io::Result<()> {
        match &mut self.inner {
            #[cfg(unix)]
            WriterInner::Pipe(_) => Ok(()),
            WriterInner::Stream(stream) => {
                stream.flush().await?;
                self.unflushed = false;
                Ok(())
            }
        }
    }
}

/// Both ends of the duplex byte stream to a native host.
///
/// Exclusively owned by whoever drives the protocol; dropping it closes the
/// pipes, which a well-behaved host sees as EOF on stdin.
pub struct HostChannel {
    reader: ChannelReader,
    writer: ChannelWriter,
    process: Option<HostProcess>,
}

impl HostChannel {
    /// Build a channel from already constructed halves.
    pub fn new(reader: ChannelReader, writer: ChannelWriter) -> Self {
        Self {
            reader,
            writer,
            process: None,
        }
    }

    /// Build a channel over a single bidirectional stream (e.g. `tokio::io::duplex`).
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read_half, write_half) = tokio::io::split(stream);
        Self::new(
            ChannelReader::from_stream(read_half),
            ChannelWriter::from_stream(write_half),
        )
    }

    /// Take over a spawned child's stdout (our read side) and stdin (our write side).
    ///
    /// The child must have been spawned with both piped. The returned channel
    /// also owns the process handle. Must be called from within a tokio runtime.
    pub fn from_child(mut child: Child) -> Result<Self> {
        let stdout = child
            .stdout
            .take()
            .ok_or(ChannelError::MissingPipe("stdout"))?;
        let stdin = child
            .stdin
            .take()
            .ok_or(ChannelError::MissingPipe("stdin"))?;

        #[cfg(unix)]
        let (reader, writer) = (
            ChannelReader::from_pipe(pipe::Receiver::from_owned_fd(stdout.into_owned_fd()?)?),
            ChannelWriter::from_pipe(pipe::Sender::from_owned_fd(stdin.into_owned_fd()?)?),
        );
        #[cfg(not(unix))]
        let (reader, writer) = (
            ChannelReader::from_stream(stdout),
            ChannelWriter::from_stream(stdin),
        );

        let process = HostProcess::new(child);
        debug!(pid = ?process.id(), strategy = ?reader.strategy(), "host channel attached to child pipes");
        Ok(Self::new(reader, writer).with_process(process))
    }

    /// Attach the process this channel talks to.
    pub fn with_process(mut self, process: HostProcess) -> Self {
        self.process = Some(process);
        self
    }

    /// OS process id of the attached host, if any and still known.
    pub fn process_id(&self) -> Option<u32> {
        self.process.as_ref().and_then(HostProcess::id)
    }

    /// Split into independently drivable halves and the process handle.
    pub fn into_parts(self) -> (ChannelReader, ChannelWriter, Option<HostProcess>) {
        (self.reader, self.writer, self.process)
    }
}

impl fmt::Debug for HostChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostChannel")
            .field("read", &self.reader.strategy())
            .field("write", &self.writer.strategy())
            .field("pid", &self.process_id())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::process::Stdio;

    use super::*;

    #[tokio::test]
    async fn stream_channel_reads_and_writes() {
        let (ours, mut theirs) = tokio::io::duplex(64);
        let channel = HostChannel::from_stream(ours);
        let (mut reader, mut writer, process) = channel.into_parts();

        assert!(process.is_none());
        assert_eq!(reader.strategy(), IoStrategy::Direct);
        assert_eq!(writer.strategy(), IoStrategy::Direct);

        let n = writer.write(b"ping").await.unwrap();
        assert_eq!(n, 4);
        let mut buf = [0u8; 4];
        theirs.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ping");

        theirs.write_all(b"pong").await.unwrap();
        let n = reader.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"pong");
    }

    #[tokio::test]
    async fn stream_writes_are_flushed_separately() {
        let (ours, mut theirs) = tokio::io::duplex(64);
        let mut writer = ChannelWriter::from_stream(tokio::io::BufWriter::new(ours));
        assert!(!writer.needs_flush());

        assert_eq!(writer.write(b"held").await.unwrap(), 4);
        assert!(writer.needs_flush());

        writer.flush().await.unwrap();
        assert!(!writer.needs_flush());
        let mut buf = [0u8; 4];
        theirs.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"held");
    }

    #[tokio::test]
    async fn stream_channel_reports_eof() {
        let (ours, theirs) = tokio::io::duplex(64);
        let (mut reader, _writer, _) = HostChannel::from_stream(ours).into_parts();
        drop(theirs);

        let mut buf = [0u8; 8];
        assert_eq!(reader.read(&mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn from_child_requires_pipes() {
        let child = tokio::process::Command::new(std::env::current_exe().unwrap())
            .arg("--list")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .spawn()
            .unwrap();

        let err = HostChannel::from_child(child).unwrap_err();
        assert!(matches!(err, ChannelError::MissingPipe("stdout")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn child_pipes_use_readiness_strategy() {
        let child = tokio::process::Command::new("cat")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .unwrap();

        let channel = HostChannel::from_child(child).unwrap();
        assert!(channel.process_id().is_some());
        let (mut reader, mut writer, process) = channel.into_parts();
        assert_eq!(reader.strategy(), IoStrategy::WaitReady);
        assert_eq!(writer.strategy(), IoStrategy::WaitReady);

        let mut sent = 0;
        while sent < 5 {
            sent += writer.write(&b"hello"[sent..]).await.unwrap();
        }

        let mut echoed = Vec::new();
        let mut buf = [0u8; 16];
        while echoed.len() < 5 {
            let n = reader.read(&mut buf).await.unwrap();
            assert!(n > 0, "cat exited early");
            echoed.extend_from_slice(&buf[..n]);
        }
        assert_eq!(echoed, b"hello");

        drop(writer);
        let status = process
            .unwrap()
            .ensure_terminated(std::time::Duration::from_secs(5))
            .await
            .unwrap();
        assert!(status.success(), "cat should exit cleanly on stdin EOF");
    }
}
