//! Incoming accumulator and outgoing frame queue.

use std::collections::VecDeque;

use bytes::{Bytes, BytesMut};
use hostpipe_frame::{decode_frame, FrameError};

/// Bytes read from the host that have not been resolved into messages yet.
///
/// Only the bytes of fully decoded frames are ever consumed, from the front.
#[derive(Debug)]
pub struct IncomingBuffer {
    buf: BytesMut,
    max_message_size: usize,
}

impl IncomingBuffer {
    pub fn new(max_message_size: usize) -> Self {
        Self {
            buf: BytesMut::new(),
            max_message_size,
        }
    }

    /// Append freshly read bytes.
    pub fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Pop the next complete message, if one is buffered.
    ///
    /// An oversized header is an error as soon as it is visible.
    pub fn next_message(&mut self) -> Result<Option<Bytes>, FrameError> {
        decode_frame(&mut self.buf, self.max_message_size)
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

/// FIFO of encoded frames waiting to be written, plus the one in flight.
///
/// Unbounded: a sender that outpaces the host grows this without limit.
#[derive(Debug, Default)]
pub struct OutgoingQueue {
    queue: VecDeque<Bytes>,
    current: Option<Bytes>,
    cursor: usize,
}

impl OutgoingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an already encoded frame behind everything sent before it.
    pub fn push(&mut self, frame: Bytes) {
        self.queue.push_back(frame);
    }

    /// Make sure a buffer with unwritten bytes is in flight, if there is one.
    ///
    /// Returns `false` when everything has been written (the write side is idle).
    pub fn prepare(&mut self) -> bool {
        while self.remaining().is_empty() {
            match self.queue.pop_front() {
                Some(next) => {
                    self.current = Some(next);
                    self.cursor = 0;
                }
                None => {
                    self.current = None;
                    self.cursor = 0;
                    return false;
                }
            }
        }
        true
    }

    /// Unwritten bytes of the in-flight buffer; empty when idle.
    pub fn remaining(&self) -> &[u8] {
        self.current
            .as_deref()
            .map_or(&[][..], |buf| &buf[self.cursor..])
    }

    /// Record that `n` bytes of the in-flight buffer were written.
    pub fn advance(&mut self, n: usize) {
        debug_assert!(n <= self.remaining().len());
        self.cursor = (self.cursor + n).min(self.current.as_ref().map_or(0, Bytes::len));
    }

    /// Frames not fully written yet, including a partially written one.
    pub fn len(&self) -> usize {
        self.queue.len() + usize::from(!self.remaining().is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop everything unwritten, returning how many frames were discarded.
    pub fn clear(&mut self) -> usize {
        let discarded = self.len();
        self.queue.clear();
        self.current = None;
        self.cursor = 0;
        discarded
    }
}

#[cfg(test)]
mod tests {
    use hostpipe_frame::{encoded, MAX_MESSAGE_SIZE};

    use super::*;

    #[test]
    fn incoming_yields_only_complete_messages() {
        let wire = encoded(b"{}").unwrap();
        let mut incoming = IncomingBuffer::new(MAX_MESSAGE_SIZE);

        incoming.extend(&wire[..3]);
        assert!(incoming.next_message().unwrap().is_none());
        assert_eq!(incoming.len(), 3);

        incoming.extend(&wire[3..]);
        assert_eq!(incoming.next_message().unwrap().unwrap().as_ref(), b"{}");
        assert!(incoming.is_empty());
    }

    #[test]
    fn incoming_keeps_bytes_of_following_frame() {
        let mut wire = encoded(b"one").unwrap().to_vec();
        wire.extend_from_slice(&encoded(b"two").unwrap()[..5]);
        let mut incoming = IncomingBuffer::new(MAX_MESSAGE_SIZE);

        incoming.extend(&wire);
        assert_eq!(incoming.next_message().unwrap().unwrap().as_ref(), b"one");
        assert!(incoming.next_message().unwrap().is_none());
        assert_eq!(incoming.len(), 5);
    }

    #[test]
    fn incoming_rejects_oversized_header() {
        let mut incoming = IncomingBuffer::new(8);
        incoming.extend(&9u32.to_ne_bytes());
        assert!(incoming.next_message().unwrap_err().is_oversized());
    }

    #[test]
    fn outgoing_is_idle_when_empty() {
        let mut outgoing = OutgoingQueue::new();
        assert!(!outgoing.prepare());
        assert!(outgoing.remaining().is_empty());
        assert!(outgoing.is_empty());
    }

    #[test]
    fn outgoing_drains_in_push_order_with_partial_writes() {
        let mut outgoing = OutgoingQueue::new();
        outgoing.push(Bytes::from_static(b"abc"));
        outgoing.push(Bytes::from_static(b"de"));
        assert_eq!(outgoing.len(), 2);

        let mut written = Vec::new();
        while outgoing.prepare() {
            let chunk = &outgoing.remaining()[..1];
            written.extend_from_slice(chunk);
            outgoing.advance(1);
        }

        assert_eq!(written, b"abcde");
        assert!(outgoing.is_empty());
    }

    #[test]
    fn outgoing_counts_partially_written_frame() {
        let mut outgoing = OutgoingQueue::new();
        outgoing.push(Bytes::from_static(b"abc"));
        outgoing.push(Bytes::from_static(b"de"));

        assert!(outgoing.prepare());
        outgoing.advance(2);
        assert_eq!(outgoing.remaining(), b"c");
        assert_eq!(outgoing.len(), 2);

        outgoing.advance(1);
        assert_eq!(outgoing.len(), 1);
        assert!(outgoing.prepare());
        assert_eq!(outgoing.remaining(), b"de");
    }

    #[test]
    fn outgoing_skips_empty_frames_and_clears() {
        let mut outgoing = OutgoingQueue::new();
        outgoing.push(Bytes::new());
        outgoing.push(Bytes::from_static(b"x"));
        outgoing.push(Bytes::from_static(b"y"));

        assert!(outgoing.prepare());
        assert_eq!(outgoing.remaining(), b"x");
        assert_eq!(outgoing.clear(), 2);
        assert!(!outgoing.prepare());
    }
}
