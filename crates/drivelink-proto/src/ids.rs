//! Wire-format constants.
//!
//! Message-type bytes come from the reverse-engineered vehicle firmware
//! protocol. Client-to-vehicle and vehicle-to-client types live in
//! separate ranges and never overlap, so a single byte routes a packet.

/// GATT service carrying the protocol endpoints.
pub const SERVICE_UUID: &str = "be15beef-6186-407e-8381-0bd89c4d8df4";
/// Notification (read) characteristic inside [`SERVICE_UUID`].
pub const READ_CHARACTERISTIC_UUID: &str = "be15bee0-6186-407e-8381-0bd89c4d8df4";
/// Command (write) characteristic inside [`SERVICE_UUID`].
pub const WRITE_CHARACTERISTIC_UUID: &str = "be15bee1-6186-407e-8381-0bd89c4d8df4";

/// Client-to-vehicle message types.
pub mod c2v {
    /// Ask the vehicle to drop the link from its side.
    pub const DISCONNECT: u8 = 0x0D;
    /// Liveness probe; the vehicle answers with [`super::v2c::PONG`].
    pub const PING: u8 = 0x16;
    /// Firmware version query.
    pub const VERSION_REQUEST: u8 = 0x18;
    /// Battery voltage query.
    pub const VOLTAGE_REQUEST: u8 = 0x1A;
    /// Switch fixed lights via a nibble bitmask.
    pub const SET_LIGHTS: u8 = 0x1D;
    /// Set forward speed and acceleration.
    pub const SET_SPEED: u8 = 0x24;
    /// Move to a new lateral offset.
    pub const CHANGE_LANE: u8 = 0x25;
    /// Abort an in-flight lane change.
    pub const CANCEL_LANE_CHANGE: u8 = 0x26;
    /// Re-declare where the road centre is relative to the vehicle.
    pub const SET_TRACK_CENTER: u8 = 0x2C;
    /// Brake once the next piece boundary is crossed.
    pub const STOP_ON_NEXT_TRANSITION: u8 = 0x2E;
    /// Turn around.
    pub const TURN_180: u8 = 0x32;
    /// Up to three per-channel light effects.
    pub const LIGHT_PATTERN: u8 = 0x33;
    /// Enable SDK mode; required before the vehicle accepts commands.
    pub const SET_SDK: u8 = 0x90;
}

/// Vehicle-to-client message types.
pub mod v2c {
    /// Answer to [`super::c2v::PING`].
    pub const PONG: u8 = 0x17;
    /// Answer to [`super::c2v::VERSION_REQUEST`].
    pub const VERSION_RESPONSE: u8 = 0x19;
    /// Answer to [`super::c2v::VOLTAGE_REQUEST`].
    pub const VOLTAGE_RESPONSE: u8 = 0x1B;
    /// Localization fix part-way along a track piece.
    pub const TRACK_PIECE_UPDATE: u8 = 0x27;
    /// The vehicle crossed onto a new track piece.
    pub const TRACK_PIECE_CHANGE: u8 = 0x29;
    /// The vehicle lost confidence in its track position.
    pub const DELOCALIZED: u8 = 0x2B;
    /// Charging-dock status snapshot.
    pub const CHARGER_INFO: u8 = 0x3F;
}

/// Returns a human-readable name for a message type, for log lines.
pub fn message_name(msg_type: u8) -> &'static str {
    match msg_type {
        c2v::DISCONNECT => "DISCONNECT",
        c2v::PING => "PING",
        c2v::VERSION_REQUEST => "VERSION_REQUEST",
        c2v::VOLTAGE_REQUEST => "VOLTAGE_REQUEST",
        c2v::SET_LIGHTS => "SET_LIGHTS",
        c2v::SET_SPEED => "SET_SPEED",
        c2v::CHANGE_LANE => "CHANGE_LANE",
        c2v::CANCEL_LANE_CHANGE => "CANCEL_LANE_CHANGE",
        c2v::SET_TRACK_CENTER => "SET_TRACK_CENTER",
        c2v::STOP_ON_NEXT_TRANSITION => "STOP_ON_NEXT_TRANSITION",
        c2v::TURN_180 => "TURN_180",
        c2v::LIGHT_PATTERN => "LIGHT_PATTERN",
        c2v::SET_SDK => "SET_SDK",
        v2c::PONG => "PONG",
        v2c::VERSION_RESPONSE => "VERSION_RESPONSE",
        v2c::VOLTAGE_RESPONSE => "VOLTAGE_RESPONSE",
        v2c::TRACK_PIECE_UPDATE => "TRACK_PIECE_UPDATE",
        v2c::TRACK_PIECE_CHANGE => "TRACK_PIECE_CHANGE",
        v2c::DELOCALIZED => "DELOCALIZED",
        v2c::CHARGER_INFO => "CHARGER_INFO",
        _ => "UNKNOWN",
    }
}
