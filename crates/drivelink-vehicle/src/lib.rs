//! Vehicle session management for the drivelink protocol.
//!
//! A [`Vehicle`] owns one transport link and keeps a live model of the
//! peer derived purely from its notifications: road offset, speed, map
//! position, battery. Callers issue commands, await track transitions,
//! and register watchers; a background keep-alive supervisor pings the
//! vehicle and tears the session down when it goes silent.

pub mod battery;
pub mod error;
pub mod keepalive;
pub mod lane;
mod pending;
pub mod track;
pub mod vehicle;
pub mod watch;

pub use battery::BatteryState;
pub use error::{Result, VehicleError};
pub use keepalive::KeepAliveConfig;
pub use lane::{Lane, LaneLayout};
pub use track::{PieceDecodeError, TrackPiece, TrackPieceType};
pub use vehicle::{LightSwitches, TurnTrigger, TurnType, Vehicle, VehicleConfig};
pub use watch::WatcherId;
