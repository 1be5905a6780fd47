//! Length-prefixed message framing for native messaging hosts.
//!
//! Every message on the wire is a 4-byte payload length in native byte order
//! followed by the payload itself (UTF-8 JSON by convention). There is no magic,
//! no type byte and no checksum, so a header declaring more than the configured
//! maximum is treated as a fatal stream error rather than "wait for more data".
//!
//! The decoder works against a caller-owned accumulator, which makes it
//! independent of how the byte stream happens to be chunked.

#[cfg(feature = "async")]
pub mod async_codec;
pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub use async_codec::HostCodec;
pub use codec::{
    decode_frame, encode_frame, encoded, peek_length, FrameConfig, HEADER_SIZE, MAX_MESSAGE_SIZE,
};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;
