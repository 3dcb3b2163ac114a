//! Lane geometry queries.
//!
//! A lane is a discrete lateral position derived from the continuous
//! offset-from-centre measurement the vehicle reports. The session
//! queries the closest lane on demand and never caches the answer.

use serde::{Deserialize, Serialize};

/// A discrete lateral position on a track piece.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lane {
    index: usize,
    offset: f32,
}

impl Lane {
    /// Zero-based index within the layout, leftmost first.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Lane centre as an offset from the road centre, mm.
    pub fn offset(&self) -> f32 {
        self.offset
    }
}

/// The lane centres of one physical track width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneLayout {
    offsets: Vec<f32>,
}

impl LaneLayout {
    /// A layout from explicit lane-centre offsets, leftmost first.
    pub fn new(offsets: Vec<f32>) -> Self {
        Self { offsets }
    }

    /// The standard three-lane track.
    pub fn three_lane() -> Self {
        Self::new(vec![-60.0, 0.0, 60.0])
    }

    /// The standard four-lane track.
    pub fn four_lane() -> Self {
        Self::new(vec![-68.0, -23.0, 23.0, 68.0])
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// The lane at `index`, if the layout has one.
    pub fn lane(&self, index: usize) -> Option<Lane> {
        self.offsets.get(index).map(|&offset| Lane { index, offset })
    }

    /// The lane whose centre is closest to `offset`.
    pub fn closest_lane(&self, offset: f32) -> Option<Lane> {
        self.offsets
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                (*a - offset)
                    .abs()
                    .total_cmp(&(*b - offset).abs())
            })
            .map(|(index, &centre)| Lane {
                index,
                offset: centre,
            })
    }
}
