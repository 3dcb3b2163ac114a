//! Packet framing and binary codecs for the drivelink vehicle protocol.
//!
//! The wire format is a fixed, reverse-engineered binary protocol. Every
//! message is framed with:
//! - A 1-byte size field counting the message-type byte plus the payload
//! - A 1-byte message type used by the peer to route it
//!
//! Everything here is pure: encoders turn typed arguments into framed
//! packets, decoders turn payload bytes into typed values. Session state
//! and I/O live in `drivelink-vehicle` and `drivelink-transport`.

pub mod command;
pub mod error;
pub mod ids;
pub mod lights;
pub mod notification;
pub mod packet;

pub use error::{ProtoError, Result};
pub use lights::{
    FadePattern, FlashPattern, LightChannel, LightPattern, RandomPattern, SteadyPattern,
    ThrobPattern, MAX_INTENSITY, PATTERN_RECORD_SIZE,
};
pub use notification::{ChargerInfo, Notification, TrackPieceChange, TrackPieceUpdate};
pub use packet::{frame, unframe, HEADER_SIZE, MAX_PAYLOAD};
