use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_core::Stream;
use tokio::sync::mpsc;

use crate::reason::CloseReason;

/// Receives what a native host sends back.
///
/// Callbacks run on the host task, so they should hand work off rather than
/// block. After `channel_closed` nothing else is ever delivered.
pub trait Client: Send + 'static {
    /// One complete message payload, in the order the host wrote it.
    fn deliver(&mut self, message: Bytes);

    /// The channel is gone. Called exactly once.
    fn channel_closed(&mut self, reason: CloseReason);
}

/// What a [`ChannelClient`] forwards to its [`HostEvents`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Message(Bytes),
    Closed(CloseReason),
}

/// A [`Client`] that forwards everything into an unbounded channel.
#[derive(Debug)]
pub struct ChannelClient {
    tx: mpsc::UnboundedSender<HostEvent>,
}

/// Receiving end of a [`ChannelClient`].
///
/// Yields every message followed by a single [`HostEvent::Closed`], then ends.
#[derive(Debug)]
pub struct HostEvents {
    rx: mpsc::UnboundedReceiver<HostEvent>,
}

/// Create a connected [`ChannelClient`] / [`HostEvents`] pair.
pub fn channel_client() -> (ChannelClient, HostEvents) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelClient { tx }, HostEvents { rx })
}

impl Client for ChannelClient {
    fn deliver(&mut self, message: Bytes) {
        // A dropped receiver just means nobody is listening any more.
        let _ = self.tx.send(HostEvent::Message(message));
    }

    fn channel_closed(&mut self, reason: CloseReason) {
        let _ = self.tx.send(HostEvent::Closed(reason));
    }
}

impl HostEvents {
    /// Next event, or `None` once the closed event has been consumed.
    pub async fn recv(&mut self) -> Option<HostEvent> {
        self.rx.recv().await
    }
}

impl Stream for HostEvents {
    type Item = HostEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
