//! Outbound command encoders.
//!
//! One pure function per client-to-vehicle message kind. Each returns a
//! framed packet ready for a transport write. All multi-byte fields are
//! little-endian.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{ProtoError, Result};
use crate::ids::c2v;
use crate::lights::LightPattern;
use crate::packet::frame;

/// Acceleration used when a caller does not care, in mm/s².
pub const DEFAULT_ACCELERATION: i16 = 500;

/// Most light patterns one command can carry.
pub const MAX_LIGHT_PATTERNS: usize = 3;

/// Set forward speed (mm/s) and acceleration (mm/s²).
pub fn set_speed(speed: i16, accel: i16) -> Result<Bytes> {
    let mut payload = BytesMut::with_capacity(4);
    payload.put_i16_le(speed);
    payload.put_i16_le(accel);
    frame(c2v::SET_SPEED, &payload)
}

/// Enable or disable SDK mode. The vehicle ignores control commands until
/// SDK mode is on. The flag byte semantics are undocumented upstream.
pub fn set_sdk(enabled: bool, flags: u8) -> Result<Bytes> {
    let payload = [if enabled { 0xFF } else { 0x00 }, flags];
    frame(c2v::SET_SDK, &payload)
}

/// Turn around. Type and trigger bytes are passed through as-is.
pub fn turn_180(turn_type: u8, trigger: u8) -> Result<Bytes> {
    frame(c2v::TURN_180, &[turn_type, trigger])
}

/// Move to a lateral offset from the road centre (mm).
///
/// `hop_intent` and `tag` are opaque pass-through fields with
/// undocumented firmware semantics.
pub fn change_lane(
    horizontal_speed: u16,
    horizontal_accel: u16,
    offset: f32,
    hop_intent: u8,
    tag: u8,
) -> Result<Bytes> {
    let mut payload = BytesMut::with_capacity(10);
    payload.put_u16_le(horizontal_speed);
    payload.put_u16_le(horizontal_accel);
    payload.put_f32_le(offset);
    payload.put_u8(hop_intent);
    payload.put_u8(tag);
    frame(c2v::CHANGE_LANE, &payload)
}

/// Abort an in-flight lane change.
pub fn cancel_lane_change() -> Result<Bytes> {
    frame(c2v::CANCEL_LANE_CHANGE, &[])
}

/// Tell the vehicle where the road centre is relative to its current
/// position (mm).
pub fn set_track_center(offset: f32) -> Result<Bytes> {
    let mut payload = BytesMut::with_capacity(4);
    payload.put_f32_le(offset);
    frame(c2v::SET_TRACK_CENTER, &payload)
}

/// Switch the fixed lights according to a nibble bitmask.
pub fn set_lights(mask: u8) -> Result<Bytes> {
    frame(c2v::SET_LIGHTS, &[mask])
}

/// Run up to [`MAX_LIGHT_PATTERNS`] per-channel light effects.
///
/// Fails with [`ProtoError::TooManyPatterns`] before any bytes are
/// produced when given a longer list.
pub fn light_pattern(patterns: &[LightPattern]) -> Result<Bytes> {
    if patterns.len() > MAX_LIGHT_PATTERNS {
        return Err(ProtoError::TooManyPatterns {
            count: patterns.len(),
            max: MAX_LIGHT_PATTERNS,
        });
    }
    let mut payload = BytesMut::with_capacity(1 + patterns.len() * 5);
    payload.put_u8(patterns.len() as u8);
    for pattern in patterns {
        payload.put_slice(&pattern.encode());
    }
    frame(c2v::LIGHT_PATTERN, &payload)
}

/// Liveness probe.
pub fn ping() -> Result<Bytes> {
    frame(c2v::PING, &[])
}

/// Firmware version query.
pub fn version_request() -> Result<Bytes> {
    frame(c2v::VERSION_REQUEST, &[])
}

/// Battery voltage query.
pub fn voltage_request() -> Result<Bytes> {
    frame(c2v::VOLTAGE_REQUEST, &[])
}

/// Brake once the next piece boundary is crossed.
pub fn stop_on_next_transition() -> Result<Bytes> {
    frame(c2v::STOP_ON_NEXT_TRANSITION, &[])
}

/// Ask the vehicle to drop the link from its side.
pub fn disconnect() -> Result<Bytes> {
    frame(c2v::DISCONNECT, &[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lights::{LightChannel, SteadyPattern};
    use crate::packet::unframe;

    #[test]
    fn set_speed_layout() {
        let packet = set_speed(500, 500).unwrap();
        let (msg_type, payload) = unframe(&packet).unwrap();
        assert_eq!(msg_type, c2v::SET_SPEED);
        assert_eq!(payload.as_ref(), &[0xF4, 0x01, 0xF4, 0x01]);
    }

    #[test]
    fn set_speed_negative_is_twos_complement() {
        let packet = set_speed(-100, DEFAULT_ACCELERATION).unwrap();
        let (_, payload) = unframe(&packet).unwrap();
        assert_eq!(&payload[..2], &(-100i16).to_le_bytes());
    }

    #[test]
    fn set_sdk_state_byte() {
        let (_, on) = unframe(&set_sdk(true, 0x01).unwrap()).unwrap();
        assert_eq!(on.as_ref(), &[0xFF, 0x01]);

        let (_, off) = unframe(&set_sdk(false, 0x00).unwrap()).unwrap();
        assert_eq!(off.as_ref(), &[0x00, 0x00]);
    }

    #[test]
    fn turn_layout() {
        let (msg_type, payload) = unframe(&turn_180(3, 0).unwrap()).unwrap();
        assert_eq!(msg_type, c2v::TURN_180);
        assert_eq!(payload.as_ref(), &[3, 0]);
    }

    #[test]
    fn change_lane_layout() {
        let packet = change_lane(300, 300, 23.0, 0, 0).unwrap();
        let (msg_type, payload) = unframe(&packet).unwrap();
        assert_eq!(msg_type, c2v::CHANGE_LANE);
        assert_eq!(payload.len(), 10);
        assert_eq!(&payload[..2], &300u16.to_le_bytes());
        assert_eq!(&payload[2..4], &300u16.to_le_bytes());
        assert_eq!(&payload[4..8], &23.0f32.to_le_bytes());
        assert_eq!(&payload[8..], &[0, 0]);
    }

    #[test]
    fn set_track_center_layout() {
        let (msg_type, payload) = unframe(&set_track_center(-2.5).unwrap()).unwrap();
        assert_eq!(msg_type, c2v::SET_TRACK_CENTER);
        assert_eq!(payload.as_ref(), &(-2.5f32).to_le_bytes());
    }

    #[test]
    fn set_lights_single_byte() {
        let (msg_type, payload) = unframe(&set_lights(0b0100_0100).unwrap()).unwrap();
        assert_eq!(msg_type, c2v::SET_LIGHTS);
        assert_eq!(payload.as_ref(), &[0b0100_0100]);
    }

    #[test]
    fn light_pattern_count_and_records() {
        let patterns: Vec<LightPattern> = vec![
            SteadyPattern::new(LightChannel::Tail, 10).unwrap().into(),
            SteadyPattern::new(LightChannel::Front1, 0).unwrap().into(),
        ];
        let (msg_type, payload) = unframe(&light_pattern(&patterns).unwrap()).unwrap();
        assert_eq!(msg_type, c2v::LIGHT_PATTERN);
        assert_eq!(payload.len(), 1 + 2 * 5);
        assert_eq!(payload[0], 2);
        assert_eq!(&payload[1..6], &[1, 0, 10, 0, 0]);
        assert_eq!(&payload[6..11], &[4, 0, 0, 0, 0]);
    }

    #[test]
    fn four_patterns_rejected_before_framing() {
        let one: LightPattern = SteadyPattern::new(LightChannel::Tail, 1).unwrap().into();
        let err = light_pattern(&[one; 4]).unwrap_err();
        assert!(matches!(
            err,
            ProtoError::TooManyPatterns { count: 4, max: 3 }
        ));
    }

    #[test]
    fn empty_payload_commands() {
        for (packet, msg_type) in [
            (ping().unwrap(), c2v::PING),
            (version_request().unwrap(), c2v::VERSION_REQUEST),
            (voltage_request().unwrap(), c2v::VOLTAGE_REQUEST),
            (stop_on_next_transition().unwrap(), c2v::STOP_ON_NEXT_TRANSITION),
            (cancel_lane_change().unwrap(), c2v::CANCEL_LANE_CHANGE),
            (disconnect().unwrap(), c2v::DISCONNECT),
        ] {
            let (decoded_type, payload) = unframe(&packet).unwrap();
            assert_eq!(decoded_type, msg_type);
            assert!(payload.is_empty());
        }
    }
}
