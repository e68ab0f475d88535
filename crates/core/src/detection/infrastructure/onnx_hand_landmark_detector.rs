/// Hand landmark detector using ONNX Runtime via `ort`.
///
/// Two-stage: the palm detector locates the hand, then the landmark model
/// regresses 21 points inside a square crop around it. Points are mapped back
/// into full-frame pixel coordinates.
use std::path::Path;

use super::execution_provider::{load_session, square_input_size};
use super::onnx_palm_detector::OnnxPalmDetector;
use super::preprocess::{crop_to_tensor, CropRect};
use crate::detection::domain::hand_landmark_detector::HandLandmarkDetector;
use crate::detection::domain::hand_landmarks::{HandLandmarks, HandObservation, Handedness};
use crate::shared::constants::HAND_LANDMARK_COUNT;
use crate::shared::frame::Frame;

/// Fallback landmark model input resolution.
const DEFAULT_INPUT_SIZE: u32 = 224;

/// Default minimum hand presence score.
pub const DEFAULT_PRESENCE_THRESHOLD: f64 = 0.5;

/// Screen landmark values: x, y, z per landmark.
const SCREEN_VALUES: usize = HAND_LANDMARK_COUNT * 3;

pub struct OnnxHandLandmarkDetector {
    palm_detector: OnnxPalmDetector,
    session: ort::session::Session,
    input_size: u32,
    presence_threshold: f64,
}

impl OnnxHandLandmarkDetector {
    pub fn new(
        palm_detector: OnnxPalmDetector,
        landmark_model_path: &Path,
        presence_threshold: f64,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let session = load_session(landmark_model_path)?;
        let input_size = square_input_size(&session).unwrap_or(DEFAULT_INPUT_SIZE);
        Ok(Self {
            palm_detector,
            session,
            input_size,
            presence_threshold,
        })
    }
}

impl HandLandmarkDetector for OnnxHandLandmarkDetector {
    fn detect(
        &mut self,
        frame: &Frame,
    ) -> Result<Option<HandObservation>, Box<dyn std::error::Error>> {
        if frame.is_empty() {
            return Ok(None);
        }

        // 1. Palm
        let palms = self.palm_detector.detect(frame)?;
        let Some(palm) = palms.first() else {
            log::debug!("No palm found");
            return Ok(None);
        };
        let crop = palm.hand_crop();

        // 2. Landmarks
        let input_tensor = crop_to_tensor(frame, &crop, self.input_size);
        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;

        // Outputs: screen landmarks [1, 63], presence [1, 1], handedness [1, 1]
        // (a fourth world-landmark tensor is ignored).
        if outputs.len() < 3 {
            return Err(format!(
                "Hand landmark model expected at least 3 outputs, got {}",
                outputs.len()
            )
            .into());
        }
        let screen = outputs[0].try_extract_array::<f32>()?;
        let presence = outputs[1].try_extract_array::<f32>()?;
        let handedness = outputs[2].try_extract_array::<f32>()?;

        let screen = screen.as_slice().ok_or("Cannot get landmark slice")?;
        let presence = *presence
            .as_slice()
            .and_then(|s| s.first())
            .ok_or("Empty presence output")? as f64;
        let handedness = *handedness
            .as_slice()
            .and_then(|s| s.first())
            .ok_or("Empty handedness output")?;

        if presence < self.presence_threshold {
            log::debug!("Hand presence {presence:.2} below threshold");
            return Ok(None);
        }

        let points = map_landmarks(screen, &crop, self.input_size)?;
        let landmarks = HandLandmarks::from_slice(&points)?;
        Ok(Some(HandObservation {
            landmarks,
            handedness: Some(handedness_from_score(handedness)),
            presence,
        }))
    }
}

/// Convert crop-space screen landmarks to whole-pixel frame coordinates.
fn map_landmarks(
    screen: &[f32],
    crop: &CropRect,
    input_size: u32,
) -> Result<Vec<(f64, f64)>, Box<dyn std::error::Error>> {
    if screen.len() < SCREEN_VALUES {
        return Err(format!(
            "Hand landmark output has {} values, expected {SCREEN_VALUES}",
            screen.len()
        )
        .into());
    }
    Ok(screen[..SCREEN_VALUES]
        .chunks_exact(3)
        .map(|v| {
            let (x, y) = crop.to_frame(v[0] as f64, v[1] as f64, input_size);
            (x.trunc(), y.trunc())
        })
        .collect())
}

fn handedness_from_score(score: f32) -> Handedness {
    if score > 0.5 {
        Handedness::Right
    } else {
        Handedness::Left
    }
}
