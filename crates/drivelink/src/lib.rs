//! Client library for a reverse-engineered model-vehicle control
//! protocol.
//!
//! drivelink speaks the binary protocol of radio-controlled model
//! vehicles that expose a single bidirectional byte-stream
//! characteristic: it encodes commands, decodes notifications, keeps a
//! live per-vehicle state model and supervises liveness.
//!
//! # Crate Structure
//!
//! - [`transport`] — The byte-stream transport trait concrete links
//!   implement
//! - [`proto`] — Packet framing, command/notification codecs, light
//!   patterns, wire constants
//! - [`vehicle`] — The session: lifecycle, dispatch, watchers,
//!   keep-alive

/// Re-export transport types.
pub mod transport {
    pub use drivelink_transport::*;
}

/// Re-export protocol codec types.
pub mod proto {
    pub use drivelink_proto::*;
}

/// Re-export vehicle session types.
pub mod vehicle {
    pub use drivelink_vehicle::*;
}

pub mod logging;
