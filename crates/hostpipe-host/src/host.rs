use std::io::{self, ErrorKind};

use bytes::Bytes;
use hostpipe_channel::{ChannelReader, ChannelWriter, HostProcess};
use hostpipe_frame::encoded;
use hostpipe_launcher::Launcher;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, trace, warn};

use crate::buffers::{IncomingBuffer, OutgoingQueue};
use crate::client::{channel_client, Client, HostEvents};
use crate::config::HostConfig;
use crate::error::{HostError, Result};
use crate::reason::CloseReason;
use crate::state::HostState;

#[derive(Debug)]
enum Command {
    Send(Bytes),
    Close,
}

/// A native messaging channel that has not been started yet.
///
/// ```no_run
/// # async fn demo(launcher: hostpipe_launcher::ManifestLauncher) -> hostpipe_host::Result<()> {
/// use hostpipe_host::{HostEvent, NativeMessageHost};
///
/// let (handle, mut events) =
///     NativeMessageHost::new("app://example/", "com.example.echo", launcher).spawn();
/// handle.send(r#"{"type":"hello"}"#)?;
/// while let Some(event) = events.recv().await {
///     match event {
///         HostEvent::Message(payload) => println!("{}", String::from_utf8_lossy(&payload)),
///         HostEvent::Closed(reason) => eprintln!("{reason}"),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct NativeMessageHost<L> {
    origin: String,
    host_name: String,
    launcher: L,
    config: HostConfig,
}

impl<L: Launcher> NativeMessageHost<L> {
    pub fn new(origin: impl Into<String>, host_name: impl Into<String>, launcher: L) -> Self {
        Self {
            origin: origin.into(),
            host_name: host_name.into(),
            launcher,
            config: HostConfig::default(),
        }
    }

    pub fn with_config(mut self, config: HostConfig) -> Self {
        self.config = config;
        self
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    /// Register `client` and launch the host on a new task.
    ///
    /// Returns immediately in [`HostState::Launching`] (or about to be).
    /// Messages sent before the launch completes are queued and written once
    /// the host is running. Must be called from within a tokio runtime.
    pub fn start<C: Client>(self, client: C) -> HostHandle {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(HostState::Created);

        let task = HostTask {
            commands: command_rx,
            client,
            incoming: IncomingBuffer::new(self.config.max_message_size),
            outgoing: OutgoingQueue::new(),
            config: self.config,
            state: state_tx,
            close_reason: None,
            process: None,
        };
        tokio::spawn(task.run(self.launcher, self.origin, self.host_name));

        HostHandle {
            commands: command_tx,
            state: state_rx,
        }
    }

    /// [`start`](Self::start) with a [`ChannelClient`](crate::ChannelClient),
    /// returning the stream of what the host sends.
    pub fn spawn(self) -> (HostHandle, HostEvents) {
        let (client, events) = channel_client();
        (self.start(client), events)
    }
}

/// Cloneable handle to a running native messaging channel.
///
/// When the last handle is dropped the channel closes with
/// [`CloseReason::ClosedByClient`].
#[derive(Debug, Clone)]
pub struct HostHandle {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<HostState>,
}

impl HostHandle {
    /// Queue one message for the host.
    ///
    /// The payload is framed here and written in call order. Fails with
    /// [`HostError::Closed`] once the channel is closed; anything accepted
    /// but not yet written when the channel closes is discarded.
    pub fn send(&self, payload: impl AsRef<[u8]>) -> Result<()> {
        let frame = encoded(payload.as_ref())?;
        self.commands
            .send(Command::Send(frame))
            .map_err(|_| HostError::Closed)
    }

    /// Serialize `value` as JSON and [`send`](Self::send) it.
    pub fn send_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let payload = serde_json::to_vec(value)?;
        self.send(payload)
    }

    /// Ask the channel to close. Idempotent; a no-op once closed.
    pub fn close(&self) {
        let _ = self.commands.send(Command::Close);
    }

    pub fn state(&self) -> HostState {
        *self.state.borrow()
    }

    /// Wait until the channel has reached `target` (or gone past it).
    pub async fn wait_for_state(&self, target: HostState) -> HostState {
        let mut state = self.state.clone();
        let reached = match state.wait_for(|current| *current >= target).await {
            Ok(current) => *current,
            Err(_) => HostState::Closed,
        };
        reached
    }

    /// Wait until the channel is closed.
    ///
    /// The client's `channel_closed` call may still be in flight when this
    /// returns.
    pub async fn closed(&self) {
        self.wait_for_state(HostState::Closed).await;
    }
}

/// Everything the host task owns. Dropped as a whole when the task ends.
struct HostTask<C> {
    // Declared first so the command channel is gone before the client is.
    commands: mpsc::UnboundedReceiver<Command>,
    client: C,
    incoming: IncomingBuffer,
    outgoing: OutgoingQueue,
    config: HostConfig,
    state: watch::Sender<HostState>,
    close_reason: Option<CloseReason>,
    process: Option<HostProcess>,
}

impl<C: Client> HostTask<C> {
    async fn run<L: Launcher>(mut self, launcher: L, origin: String, host_name: String) {
        self.set_state(HostState::Launching);
        debug!(host = %host_name, origin = %origin, "launching native host");

        let launched = {
            let launch = launcher.launch(&origin, &host_name);
            tokio::pin!(launch);
            loop {
                tokio::select! {
                    result = &mut launch => break Some(result),
                    command = self.commands.recv() => match command {
                        Some(Command::Send(frame)) => self.outgoing.push(frame),
                        Some(Command::Close) | None => break None,
                    },
                }
            }
        };

        match launched {
            None => self.close(CloseReason::ClosedByClient),
            Some(Err(err)) => {
                let reason =
                    CloseReason::from_launch(err.result()).unwrap_or(CloseReason::FailedToStart);
                warn!(host = %host_name, error = %err, "native host launch failed");
                self.close(reason);
            }
            Some(Ok(channel)) => {
                debug!(host = %host_name, ?channel, "native host launched");
                let (reader, writer, process) = channel.into_parts();
                self.process = process;
                self.set_state(HostState::Running);
                self.pump(reader, writer).await;
            }
        }

        self.finish(&host_name);
    }

    /// Drive reads, writes and commands until the channel closes.
    ///
    /// The reader and writer are owned here, so they are released as soon as
    /// this returns.
    async fn pump(&mut self, mut reader: ChannelReader, mut writer: ChannelWriter) {
        let mut scratch = vec![0u8; self.config.read_buffer_size.max(1)];

        while self.close_reason.is_none() {
            let writing = self.outgoing.prepare();
            let flushing = !writing && writer.needs_flush();
            tokio::select! {
                command = self.commands.recv() => self.on_command(command),
                outcome = drive_writer(&mut writer, self.outgoing.remaining()), if writing || flushing => {
                    match outcome {
                        WriteOutcome::Wrote(result) => self.on_write(result),
                        WriteOutcome::Flushed(result) => self.on_flush(result),
                    }
                }
                result = reader.read(&mut scratch) => self.on_read(result, &scratch),
            }
        }
    }

    fn on_command(&mut self, command: Option<Command>) {
        match command {
            Some(Command::Send(frame)) => self.outgoing.push(frame),
            Some(Command::Close) => self.close(CloseReason::ClosedByClient),
            None => {
                debug!("every host handle dropped");
                self.close(CloseReason::ClosedByClient);
            }
        }
    }

    fn on_read(&mut self, result: io::Result<usize>, scratch: &[u8]) {
        match result {
            Ok(0) => {
                debug!("native host closed its stdout");
                self.close(CloseReason::HostExited);
            }
            Ok(n) => {
                trace!(bytes = n, buffered = self.incoming.len(), "read from native host");
                self.incoming.extend(&scratch[..n]);
                self.deliver_buffered();
            }
            Err(err) => match err.kind() {
                ErrorKind::Interrupted | ErrorKind::WouldBlock => {}
                ErrorKind::ConnectionReset | ErrorKind::BrokenPipe => {
                    debug!(error = %err, "native host pipe reset");
                    self.close(CloseReason::HostExited);
                }
                _ => {
                    error!(error = %err, "read from native host failed");
                    self.close(CloseReason::IoError);
                }
            },
        }
    }

    fn deliver_buffered(&mut self) {
        while self.close_reason.is_none() {
            match self.incoming.next_message() {
                Ok(Some(message)) => self.client.deliver(message),
                Ok(None) => break,
                Err(err) => {
                    warn!(error = %err, "native host sent an unacceptable frame");
                    self.close(CloseReason::MessageTooLarge);
                }
            }
        }
    }

    fn on_write(&mut self, result: io::Result<usize>) {
        match result {
            Ok(0) => {
                error!("native host accepted no bytes");
                self.close(CloseReason::IoError);
            }
            Ok(n) => {
                trace!(bytes = n, queued = self.outgoing.len(), "wrote to native host");
                self.outgoing.advance(n);
            }
            Err(err) if matches!(err.kind(), ErrorKind::Interrupted | ErrorKind::WouldBlock) => {}
            Err(err) => {
                error!(error = %err, "write to native host failed");
                self.close(CloseReason::IoError);
            }
        }
    }

    fn on_flush(&mut self, result: io::Result<()>) {
        match result {
            Ok(()) => trace!("flushed writes to native host"),
            Err(err) if matches!(err.kind(), ErrorKind::Interrupted | ErrorKind::WouldBlock) => {}
            Err(err) => {
                error!(error = %err, "flush to native host failed");
                self.close(CloseReason::IoError);
            }
        }
    }

    /// Record why the channel closed. Only the first reason counts.
    fn close(&mut self, reason: CloseReason) {
        if self.close_reason.is_some() {
            return;
        }
        self.close_reason = Some(reason);
        // Sends racing with the close fail instead of being silently dropped.
        self.commands.close();
        self.set_state(HostState::Closed);
    }

    fn set_state(&self, next: HostState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            debug!(from = %previous, to = %next, "native messaging state changed");
        }
    }

    fn finish(mut self, host_name: &str) {
        let reason = self.close_reason.unwrap_or(CloseReason::ClosedByClient);
        let discarded = self.outgoing.clear();
        if let Some(process) = self.process.take() {
            process.terminate_in_background(self.config.termination_grace);
        }
        info!(host = host_name, ?reason, discarded, "native messaging channel closed");
        self.client.channel_closed(reason);
    }
}

enum WriteOutcome {
    Wrote(io::Result<usize>),
    Flushed(io::Result<()>),
}

/// One step of the write side: write the in-flight bytes, or flush once the
/// queue has drained. Either future can be dropped without losing or
/// repeating bytes.
async fn drive_writer(writer: &mut ChannelWriter, pending: &[u8]) -> WriteOutcome {
    if pending.is_empty() {
        WriteOutcome::Flushed(writer.flush().await)
    } else {
        WriteOutcome::Wrote(writer.write(pending).await)
    }
}
