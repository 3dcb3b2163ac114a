//! Track-piece decoding.
//!
//! Track topology (maps, scanning) lives outside this crate; the session
//! only needs to turn the raw `(location, piece_id, clockwise)` triple
//! from localization notifications into a typed piece and to recognize
//! the finish line.

use serde::{Deserialize, Serialize};

/// Classification of a physical track segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackPieceType {
    Straight,
    Curve,
    Start,
    Finish,
    Intersection,
}

/// The vehicle reported a piece id this protocol does not know.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown track piece id {piece_id} at location {location}")]
pub struct PieceDecodeError {
    pub location: u8,
    pub piece_id: u8,
}

/// One discrete segment of physical track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackPiece {
    location: u8,
    piece_id: u8,
    clockwise: bool,
    piece_type: TrackPieceType,
}

impl TrackPiece {
    /// Decode the raw triple carried by localization notifications.
    pub fn from_raw(location: u8, piece_id: u8, clockwise: bool) -> Result<Self, PieceDecodeError> {
        let piece_type = match piece_id {
            17 | 18 | 20 | 23 | 24 | 27 => TrackPieceType::Curve,
            36 | 39 | 40 | 48 | 51 => TrackPieceType::Straight,
            33 => TrackPieceType::Start,
            34 => TrackPieceType::Finish,
            10 => TrackPieceType::Intersection,
            _ => return Err(PieceDecodeError { location, piece_id }),
        };
        Ok(Self {
            location,
            piece_id,
            clockwise,
            piece_type,
        })
    }

    pub fn location(&self) -> u8 {
        self.location
    }

    pub fn piece_id(&self) -> u8 {
        self.piece_id
    }

    pub fn clockwise(&self) -> bool {
        self.clockwise
    }

    pub fn piece_type(&self) -> TrackPieceType {
        self.piece_type
    }
}
