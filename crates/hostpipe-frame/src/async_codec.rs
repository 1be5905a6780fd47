//! `tokio_util` codec for the native messaging wire format.

use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{decode_frame, encode_frame, FrameConfig, MAX_MESSAGE_SIZE};
use crate::error::FrameError;

/// Stateless codec over the 4-byte native-endian length prefix.
///
/// Use with `FramedRead`/`FramedWrite` when one side of the pipe is a tokio
/// stream, e.g. a native host written on tokio or a test peer.
#[derive(Debug, Clone)]
pub struct HostCodec {
    max_message_size: usize,
}

impl HostCodec {
    pub fn new() -> Self {
        Self::with_config(&FrameConfig::default())
    }

    pub fn with_config(config: &FrameConfig) -> Self {
        Self {
            max_message_size: config.max_message_size,
        }
    }
}

impl Default for HostCodec {
    fn default() -> Self {
        Self {
            max_message_size: MAX_MESSAGE_SIZE,
        }
    }
}

impl Decoder for HostCodec {
    type Item = Bytes;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>, FrameError> {
        decode_frame(src, self.max_message_size)
    }
}

impl Encoder<Bytes> for HostCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), FrameError> {
        encode_frame(&item, dst)
    }
}

#[cfg(test)]
mod tests {
    use futures_util::{SinkExt, StreamExt};
    use tokio::io::AsyncWriteExt;
    use tokio_util::codec::{FramedRead, FramedWrite};

    use super::*;
    use crate::codec::encoded;

    #[tokio::test]
    async fn framed_roundtrip_over_duplex() {
        let (left, right) = tokio::io::duplex(64);
        let mut sink = FramedWrite::new(left, HostCodec::new());
        let mut stream = FramedRead::new(right, HostCodec::new());

        let writer = tokio::spawn(async move {
            sink.send(Bytes::from_static(br#"{"n":1}"#)).await.unwrap();
            sink.send(Bytes::from_static(br#"{"n":2}"#)).await.unwrap();
        });

        assert_eq!(stream.next().await.unwrap().unwrap().as_ref(), br#"{"n":1}"#);
        assert_eq!(stream.next().await.unwrap().unwrap().as_ref(), br#"{"n":2}"#);
        writer.await.unwrap();
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn framed_read_reassembles_small_writes() {
        let (mut left, right) = tokio::io::duplex(64);
        let mut stream = FramedRead::new(right, HostCodec::new());
        let wire = encoded(br#"{"type":"hello"}"#).unwrap();

        let writer = tokio::spawn(async move {
            for chunk in wire.chunks(3) {
                left.write_all(chunk).await.unwrap();
                tokio::task::yield_now().await;
            }
        });

        let payload = stream.next().await.unwrap().unwrap();
        assert_eq!(payload.as_ref(), br#"{"type":"hello"}"#);
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn framed_read_rejects_oversized_header() {
        let (mut left, right) = tokio::io::duplex(64);
        let mut stream = FramedRead::new(
            right,
            HostCodec::with_config(&FrameConfig {
                max_message_size: 8,
            }),
        );

        left.write_all(&9u32.to_ne_bytes()).await.unwrap();
        let err = stream.next().await.unwrap().unwrap_err();
        assert!(err.is_oversized());
    }
}
