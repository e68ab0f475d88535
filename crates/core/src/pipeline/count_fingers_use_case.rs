use std::time::Instant;

use thiserror::Error;

use crate::counting::domain::finger_counter::{ExtendedFingers, FingerCounter, FingerOutcome};
use crate::detection::domain::hand_landmark_detector::HandLandmarkDetector;
use crate::detection::domain::hand_landmarks::Handedness;
use crate::imaging::domain::image_payload::{ImagePayload, PayloadError};
use crate::imaging::domain::image_reader::ImageReader;
use crate::imaging::infrastructure::transient_image_store::{StoreError, TransientImageStore};
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum CountFingersError {
    #[error("invalid image payload: {0}")]
    Payload(#[from] PayloadError),
    #[error("could not store image: {0}")]
    Storage(#[from] StoreError),
    #[error("could not decode image: {0}")]
    Decode(String),
    #[error("hand landmark detection failed: {0}")]
    Detection(String),
}

/// Result of counting fingers on one image.
#[derive(Clone, Debug, PartialEq)]
pub struct FingerReport {
    pub outcome: FingerOutcome,
    /// Per-finger breakdown; `None` when no hand was detected.
    pub extended: Option<ExtendedFingers>,
    pub handedness: Option<Handedness>,
    pub width: u32,
    pub height: u32,
}

/// Single-image pipeline: decode → store → read → detect → classify.
pub struct CountFingersUseCase {
    reader: Box<dyn ImageReader>,
    detector: Box<dyn HandLandmarkDetector>,
    counter: FingerCounter,
    store: TransientImageStore,
    max_image_bytes: usize,
}

impl CountFingersUseCase {
    pub fn new(
        reader: Box<dyn ImageReader>,
        detector: Box<dyn HandLandmarkDetector>,
        counter: FingerCounter,
        store: TransientImageStore,
        max_image_bytes: usize,
    ) -> Self {
        Self {
            reader,
            detector,
            counter,
            store,
            max_image_bytes,
        }
    }

    /// Counts fingers in an inbound payload. The transient copy of the image
    /// is removed before this returns, on success and on error.
    pub fn execute(&mut self, payload: ImagePayload) -> Result<FingerReport, CountFingersError> {
        let bytes = payload.into_bytes(self.max_image_bytes)?;

        let start = Instant::now();
        let frame = {
            let stored = self.store.persist(&bytes)?;
            self.reader
                .read(stored.path())
                .map_err(|e| CountFingersError::Decode(e.to_string()))?
        };
        log::debug!(
            "Decoded {}x{} image in {:.1}ms",
            frame.width(),
            frame.height(),
            start.elapsed().as_secs_f64() * 1000.0
        );

        self.execute_frame(&frame)
    }

    /// Counts fingers in an already decoded frame.
    pub fn execute_frame(&mut self, frame: &Frame) -> Result<FingerReport, CountFingersError> {
        let start = Instant::now();
        let observation = self
            .detector
            .detect(frame)
            .map_err(|e| CountFingersError::Detection(e.to_string()))?;
        log::debug!(
            "Detection took {:.1}ms",
            start.elapsed().as_secs_f64() * 1000.0
        );

        let outcome = self.counter.classify(observation.as_ref());
        let extended = observation
            .as_ref()
            .map(|obs| self.counter.extended_fingers(&obs.landmarks, obs.handedness));

        Ok(FingerReport {
            outcome,
            extended,
            handedness: observation.and_then(|obs| obs.handedness),
            width: frame.width(),
            height: frame.height(),
        })
    }
}
