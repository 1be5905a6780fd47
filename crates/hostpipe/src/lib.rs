//! Talk to native messaging hosts: helper programs launched on demand that
//! exchange length-prefixed JSON over their stdin and stdout.
//!
//! # Crate Structure
//!
//! - [`frame`]: the wire format (`u32` native-endian length, then the payload)
//! - [`channel`]: duplex pipes to a launched process and its termination
//! - [`launcher`]: manifest lookup, origin checks and spawning
//! - [`host`]: the message transport tying the three together
//!
//! Most applications only need [`host::NativeMessageHost`] and a
//! [`launcher::ManifestLauncher`]. A native host written in Rust uses
//! [`frame::FrameReader`] and [`frame::FrameWriter`] on its stdio.

/// Re-export frame types.
pub mod frame {
    pub use hostpipe_frame::*;
}

/// Re-export channel types.
pub mod channel {
    pub use hostpipe_channel::*;
}

/// Re-export launcher types.
pub mod launcher {
    pub use hostpipe_launcher::*;
}

/// Re-export transport types.
pub mod host {
    pub use hostpipe_host::*;
}
