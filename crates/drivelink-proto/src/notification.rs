//! Inbound notification decoders.
//!
//! One pure decoder per vehicle-to-client message kind, unpacking the raw
//! payload into a typed value. All multi-byte fields are little-endian.
//! Truncated payloads fail with [`ProtoError::MalformedPayload`]; whether
//! that is fatal is the caller's call.

use bytes::Buf;

use crate::error::{ProtoError, Result};
use crate::ids::v2c;

/// Localization fix part-way along a track piece.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPieceUpdate {
    pub location: u8,
    pub piece_id: u8,
    /// Offset from the road centre, mm.
    pub offset: f32,
    /// Measured speed, mm/s.
    pub speed: u16,
    pub clockwise: u8,
}

/// The vehicle crossed onto a new track piece.
///
/// `road_piece` and `prev_road_piece` are always zero on real hardware;
/// they are decoded for completeness but nothing should rely on them.
/// The trailing telemetry fields (drift pixels, hill counters, wheel
/// distances) have undocumented firmware semantics and are carried
/// as-is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPieceChange {
    pub road_piece: i8,
    pub prev_road_piece: i8,
    /// Offset from the road centre, mm.
    pub road_offset: f32,
    pub last_received_lane_change_id: u16,
    pub last_executed_lane_change_id: u8,
    pub last_desired_lane_change_speed: u8,
    pub ave_follow_line_drift_pixels: u8,
    pub had_lane_change: u8,
    pub uphill_counter: u8,
    pub downhill_counter: u8,
    pub left_wheel_dist: u8,
    pub right_wheel_dist: u8,
}

/// Charging-dock status snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChargerInfo {
    pub reserved: bool,
    pub on_charger: bool,
    pub charging: bool,
    pub full: bool,
}

/// A decoded vehicle-to-client message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Notification {
    TrackPieceUpdate(TrackPieceUpdate),
    TrackPieceChange(TrackPieceChange),
    Pong,
    Delocalized,
    ChargerInfo(ChargerInfo),
    VersionResponse(u16),
    VoltageResponse(u16),
}

fn check_len(kind: &'static str, payload: &[u8], need: usize) -> Result<()> {
    if payload.len() < need {
        return Err(ProtoError::MalformedPayload {
            kind,
            len: payload.len(),
            need,
        });
    }
    Ok(())
}

/// Decode a TRACK_PIECE_UPDATE payload.
pub fn decode_track_piece_update(payload: &[u8]) -> Result<TrackPieceUpdate> {
    check_len("TRACK_PIECE_UPDATE", payload, 9)?;
    let mut buf = payload;
    Ok(TrackPieceUpdate {
        location: buf.get_u8(),
        piece_id: buf.get_u8(),
        offset: buf.get_f32_le(),
        speed: buf.get_u16_le(),
        clockwise: buf.get_u8(),
    })
}

/// Decode a TRACK_PIECE_CHANGE payload.
pub fn decode_track_piece_change(payload: &[u8]) -> Result<TrackPieceChange> {
    check_len("TRACK_PIECE_CHANGE", payload, 16)?;
    let mut buf = payload;
    Ok(TrackPieceChange {
        road_piece: buf.get_i8(),
        prev_road_piece: buf.get_i8(),
        road_offset: buf.get_f32_le(),
        last_received_lane_change_id: buf.get_u16_le(),
        last_executed_lane_change_id: buf.get_u8(),
        last_desired_lane_change_speed: buf.get_u8(),
        ave_follow_line_drift_pixels: buf.get_u8(),
        had_lane_change: buf.get_u8(),
        uphill_counter: buf.get_u8(),
        downhill_counter: buf.get_u8(),
        left_wheel_dist: buf.get_u8(),
        right_wheel_dist: buf.get_u8(),
    })
}

/// Decode a CHARGER_INFO payload.
pub fn decode_charger_info(payload: &[u8]) -> Result<ChargerInfo> {
    check_len("CHARGER_INFO", payload, 4)?;
    let mut buf = payload;
    Ok(ChargerInfo {
        reserved: buf.get_u8() != 0,
        on_charger: buf.get_u8() != 0,
        charging: buf.get_u8() != 0,
        full: buf.get_u8() != 0,
    })
}

/// Decode a VERSION_RESPONSE payload.
pub fn decode_version_response(payload: &[u8]) -> Result<u16> {
    check_len("VERSION_RESPONSE", payload, 2)?;
    let mut buf = payload;
    Ok(buf.get_u16_le())
}

/// Decode a VOLTAGE_RESPONSE payload.
pub fn decode_voltage_response(payload: &[u8]) -> Result<u16> {
    check_len("VOLTAGE_RESPONSE", payload, 2)?;
    let mut buf = payload;
    Ok(buf.get_u16_le())
}

/// Decode any known notification.
///
/// Returns `Ok(None)` for message types this protocol does not recognize;
/// the caller decides whether to log or drop them.
pub fn decode(msg_type: u8, payload: &[u8]) -> Result<Option<Notification>> {
    let notification = match msg_type {
        v2c::TRACK_PIECE_UPDATE => {
            Notification::TrackPieceUpdate(decode_track_piece_update(payload)?)
        }
        v2c::TRACK_PIECE_CHANGE => {
            Notification::TrackPieceChange(decode_track_piece_change(payload)?)
        }
        v2c::PONG => Notification::Pong,
        v2c::DELOCALIZED => Notification::Delocalized,
        v2c::CHARGER_INFO => Notification::ChargerInfo(decode_charger_info(payload)?),
        v2c::VERSION_RESPONSE => Notification::VersionResponse(decode_version_response(payload)?),
        v2c::VOLTAGE_RESPONSE => Notification::VoltageResponse(decode_voltage_response(payload)?),
        _ => return Ok(None),
    };
    Ok(Some(notification))
}

#[cfg(test)]
mod tests {
    use bytes::BufMut;

    use super::*;

    fn track_update_payload() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.put_u8(33);
        buf.put_u8(36);
        buf.put_f32_le(-23.5);
        buf.put_u16_le(450);
        buf.put_u8(1);
        buf
    }

    #[test]
    fn track_piece_update_fields() {
        let update = decode_track_piece_update(&track_update_payload()).unwrap();
        assert_eq!(update.location, 33);
        assert_eq!(update.piece_id, 36);
        assert_eq!(update.offset, -23.5);
        assert_eq!(update.speed, 450);
        assert_eq!(update.clockwise, 1);
    }

    #[test]
    fn track_piece_change_fields() {
        let mut buf = Vec::new();
        buf.put_i8(0);
        buf.put_i8(0);
        buf.put_f32_le(12.0);
        buf.put_u16_le(7);
        buf.put_u8(6);
        buf.put_u8(250);
        buf.put_u8(3);
        buf.put_u8(1);
        buf.put_u8(2);
        buf.put_u8(4);
        buf.put_u8(90);
        buf.put_u8(91);

        let change = decode_track_piece_change(&buf).unwrap();
        assert_eq!(change.road_piece, 0);
        assert_eq!(change.prev_road_piece, 0);
        assert_eq!(change.road_offset, 12.0);
        assert_eq!(change.last_received_lane_change_id, 7);
        assert_eq!(change.last_executed_lane_change_id, 6);
        assert_eq!(change.last_desired_lane_change_speed, 250);
        assert_eq!(change.ave_follow_line_drift_pixels, 3);
        assert_eq!(change.had_lane_change, 1);
        assert_eq!(change.uphill_counter, 2);
        assert_eq!(change.downhill_counter, 4);
        assert_eq!(change.left_wheel_dist, 90);
        assert_eq!(change.right_wheel_dist, 91);
    }

    #[test]
    fn charger_info_bools() {
        let info = decode_charger_info(&[0, 1, 1, 0]).unwrap();
        assert!(!info.reserved);
        assert!(info.on_charger);
        assert!(info.charging);
        assert!(!info.full);
    }

    #[test]
    fn truncated_charger_info_is_malformed() {
        let err = decode_charger_info(&[1, 0]).unwrap_err();
        assert!(matches!(
            err,
            ProtoError::MalformedPayload {
                kind: "CHARGER_INFO",
                len: 2,
                need: 4,
            }
        ));
    }

    #[test]
    fn version_and_voltage_are_u16() {
        assert_eq!(decode_version_response(&[0x39, 0x30]).unwrap(), 0x3039);
        assert_eq!(decode_voltage_response(&[0x10, 0x0E]).unwrap(), 3600);
    }

    #[test]
    fn truncated_track_update_is_malformed() {
        let mut payload = track_update_payload();
        payload.truncate(5);
        let err = decode_track_piece_update(&payload).unwrap_err();
        assert!(matches!(err, ProtoError::MalformedPayload { need: 9, .. }));
    }

    #[test]
    fn decode_routes_by_message_type() {
        let decoded = decode(v2c::TRACK_PIECE_UPDATE, &track_update_payload()).unwrap();
        assert!(matches!(decoded, Some(Notification::TrackPieceUpdate(_))));

        assert_eq!(decode(v2c::PONG, &[]).unwrap(), Some(Notification::Pong));
        assert_eq!(
            decode(v2c::DELOCALIZED, &[]).unwrap(),
            Some(Notification::Delocalized)
        );
        assert_eq!(
            decode(v2c::VERSION_RESPONSE, &[0x01, 0x00]).unwrap(),
            Some(Notification::VersionResponse(1))
        );
    }

    #[test]
    fn unknown_message_type_decodes_to_none() {
        assert_eq!(decode(0x99, &[1, 2, 3]).unwrap(), None);
    }
}
