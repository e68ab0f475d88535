use crate::detection::domain::hand_landmarks::HandObservation;
use crate::shared::frame::Frame;

/// Domain interface for hand landmark detection.
///
/// Returns `Ok(None)` when the frame contains no hand. Only the first hand is
/// reported when several are visible. Implementations hold inference
/// sessions, hence `&mut self`.
pub trait HandLandmarkDetector: Send {
    fn detect(&mut self, frame: &Frame)
        -> Result<Option<HandObservation>, Box<dyn std::error::Error>>;
}
