//! Battery state snapshots.

use serde::{Deserialize, Serialize};

use drivelink_proto::notification::{self, ChargerInfo};

// Bit positions in the discovery-advertisement status byte.
const FULL_BATTERY_BIT: u8 = 4;
const LOW_BATTERY_BIT: u8 = 5;
const ON_CHARGER_BIT: u8 = 6;

/// An immutable snapshot of the vehicle's battery.
///
/// The two sources that produce snapshots observe different fields: the
/// discovery advertisement carries a low-battery flag but no charging
/// flag, the charger-info notification the reverse. Fields a source
/// cannot observe are `None`. A snapshot is replaced wholesale on every
/// charger-info notification, never mutated in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatteryState {
    pub full_battery: bool,
    pub low_battery: Option<bool>,
    pub on_charger: bool,
    pub charging: Option<bool>,
}

impl BatteryState {
    /// Build a snapshot from the discovery-advertisement status byte.
    pub fn from_status_byte(state: u8) -> Self {
        Self {
            full_battery: state & (1 << FULL_BATTERY_BIT) != 0,
            low_battery: Some(state & (1 << LOW_BATTERY_BIT) != 0),
            on_charger: state & (1 << ON_CHARGER_BIT) != 0,
            charging: None,
        }
    }

    /// Build a snapshot from a raw CHARGER_INFO notification payload.
    ///
    /// Fails with `MalformedPayload` on a truncated payload.
    pub fn from_charger_info(payload: &[u8]) -> drivelink_proto::Result<Self> {
        Ok(notification::decode_charger_info(payload)?.into())
    }
}

impl From<ChargerInfo> for BatteryState {
    fn from(info: ChargerInfo) -> Self {
        Self {
            full_battery: info.full,
            low_battery: None,
            on_charger: info.on_charger,
            charging: Some(info.charging),
        }
    }
}

#[cfg(test)]
mod tests {
    use drivelink_proto::ProtoError;

    use super::*;

    #[test]
    fn status_byte_bits() {
        let state = BatteryState::from_status_byte(1 << FULL_BATTERY_BIT | 1 << ON_CHARGER_BIT);
        assert!(state.full_battery);
        assert_eq!(state.low_battery, Some(false));
        assert!(state.on_charger);
        assert_eq!(state.charging, None);
    }

    #[test]
    fn status_byte_low_battery() {
        let state = BatteryState::from_status_byte(1 << LOW_BATTERY_BIT);
        assert!(!state.full_battery);
        assert_eq!(state.low_battery, Some(true));
        assert!(!state.on_charger);
    }

    #[test]
    fn charger_info_fields() {
        let state = BatteryState::from_charger_info(&[0, 1, 1, 0]).unwrap();
        assert!(!state.full_battery);
        assert_eq!(state.low_battery, None);
        assert!(state.on_charger);
        assert_eq!(state.charging, Some(true));
    }

    #[test]
    fn truncated_charger_info_fails() {
        let err = BatteryState::from_charger_info(&[1]).unwrap_err();
        assert!(matches!(err, ProtoError::MalformedPayload { .. }));
    }

    #[test]
    fn serializes_unknown_fields_as_null() {
        let state = BatteryState::from_status_byte(0);
        let json = serde_json::to_value(state).unwrap();
        assert_eq!(json["charging"], serde_json::Value::Null);
    }
}
