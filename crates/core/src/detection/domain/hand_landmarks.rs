//! 21-point hand landmarks in pixel space.
//!
//! Indices follow the fixed anatomical numbering used by hand landmark models:
//! wrist first, then four joints per digit from the palm outward, thumb to pinky.

use serde::Serialize;
use thiserror::Error;

use crate::shared::constants::HAND_LANDMARK_COUNT;

pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_DIP: usize = 7;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_DIP: usize = 15;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_DIP: usize = 19;
pub const PINKY_TIP: usize = 20;

#[derive(Error, Debug, PartialEq, Eq)]
#[error("hand landmarks require exactly {expected} points, got {actual}")]
pub struct LandmarkCountError {
    pub expected: usize,
    pub actual: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HandLandmarks {
    points: [(f64, f64); HAND_LANDMARK_COUNT],
}

impl HandLandmarks {
    pub fn new(points: [(f64, f64); HAND_LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    /// Builds landmarks from a detector's point list, rejecting partial hands.
    pub fn from_slice(points: &[(f64, f64)]) -> Result<Self, LandmarkCountError> {
        let points: [(f64, f64); HAND_LANDMARK_COUNT] =
            points.try_into().map_err(|_| LandmarkCountError {
                expected: HAND_LANDMARK_COUNT,
                actual: points.len(),
            })?;
        Ok(Self { points })
    }

    /// Scales normalized `[0, 1]` coordinates to whole pixels of a
    /// `width × height` image.
    pub fn from_normalized(
        points: &[(f64, f64)],
        width: u32,
        height: u32,
    ) -> Result<Self, LandmarkCountError> {
        let scaled: Vec<(f64, f64)> = points
            .iter()
            .map(|&(x, y)| ((x * width as f64).trunc(), (y * height as f64).trunc()))
            .collect();
        Self::from_slice(&scaled)
    }

    pub fn points(&self) -> &[(f64, f64); HAND_LANDMARK_COUNT] {
        &self.points
    }

    pub fn point(&self, index: usize) -> (f64, f64) {
        self.points[index]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Handedness {
    Left,
    Right,
}

/// One detected hand as reported by a landmark provider.
#[derive(Clone, Debug, PartialEq)]
pub struct HandObservation {
    pub landmarks: HandLandmarks,
    /// `None` when the provider cannot tell which hand it saw.
    pub handedness: Option<Handedness>,
    /// Provider confidence that a hand is present, in `[0, 1]`.
    pub presence: f64,
}

impl HandObservation {
    pub fn new(landmarks: HandLandmarks) -> Self {
        Self {
            landmarks,
            handedness: None,
            presence: 1.0,
        }
    }

    pub fn with_handedness(mut self, handedness: Handedness) -> Self {
        self.handedness = Some(handedness);
        self
    }
}
