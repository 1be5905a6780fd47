use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::warn;

use crate::error::{FrameError, Result};

/// Frame header: a single native-endian `u32` payload length.
pub const HEADER_SIZE: usize = 4;

/// Largest payload accepted from a native host: 1 MiB.
///
/// A misbehaving host that starts writing garbage to its stdout would otherwise
/// make us buffer up to 4 GiB waiting for a frame that never completes.
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Encode a payload into the wire format and append it to `dst`.
///
/// Wire format:
/// ```text
/// ┌──────────────────┬──────────────────────┐
/// │ Length (4B)      │ Payload              │
/// │ u32, native end. │ (Length bytes, JSON) │
/// └──────────────────┴──────────────────────┘
/// ```
///
/// Outgoing payloads are only bounded by what the header can express; the
/// [`MAX_MESSAGE_SIZE`] limit applies to what we accept, not what we send.
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    let len = u32::try_from(payload.len()).map_err(|_| FrameError::PayloadTooLarge {
        size: payload.len(),
        max: u32::MAX as usize,
    })?;
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_slice(&len.to_ne_bytes());
    dst.put_slice(payload);
    Ok(())
}

/// Encode a payload into a standalone frame buffer.
pub fn encoded(payload: &[u8]) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    encode_frame(payload, &mut buf)?;
    Ok(buf.freeze())
}

/// Read the declared payload length without consuming anything.
///
/// Returns `None` while fewer than [`HEADER_SIZE`] bytes are buffered.
pub fn peek_length(src: &[u8]) -> Option<usize> {
    let header: [u8; HEADER_SIZE] = src.get(..HEADER_SIZE)?.try_into().ok()?;
    Some(u32::from_ne_bytes(header) as usize)
}

/// Decode one frame from the front of an accumulator.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet, in
/// which case nothing is consumed. On success only the bytes of the decoded
/// frame are consumed; anything after it stays buffered for the next call.
///
/// A header declaring more than `max_payload` bytes is an error as soon as the
/// header is visible, even if the body never arrives.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<Bytes>> {
    let Some(payload_len) = peek_length(src) else {
        return Ok(None); // Need more data
    };

    if payload_len > max_payload {
        warn!(
            size = payload_len,
            max = max_payload,
            "native host declared an oversized message"
        );
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    if src.len() < HEADER_SIZE + payload_len {
        return Ok(None); // Need more data
    }

    src.advance(HEADER_SIZE);
    Ok(Some(src.split_to(payload_len).freeze()))
}

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum accepted payload size in bytes. Default: 1 MiB.
    pub max_message_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_message_size: MAX_MESSAGE_SIZE,
        }
    }
}
