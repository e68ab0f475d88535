use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use finger_count_core::counting::domain::finger_counter::ExtendedFingers;
use finger_count_core::detection::domain::hand_landmarks::Handedness;
use finger_count_core::pipeline::count_fingers_use_case::{CountFingersError, FingerReport};

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub fingers: u8,
    pub hand_detected: bool,
    pub handedness: Option<Handedness>,
    pub extended: Option<ExtendedFingers>,
}

impl From<&FingerReport> for AnalyzeResponse {
    fn from(report: &FingerReport) -> Self {
        Self {
            fingers: report.outcome.fingers(),
            hand_detected: report.outcome.hand_detected(),
            handedness: report.handedness,
            extended: report.extended,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Failures surfaced to HTTP clients.
#[derive(Debug, PartialEq, Eq)]
pub enum ApiError {
    NoImage,
    InvalidImage,
    DetectionFailed,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NoImage | ApiError::InvalidImage => StatusCode::BAD_REQUEST,
            ApiError::DetectionFailed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ApiError::NoImage => "No image received",
            ApiError::InvalidImage => "Invalid image",
            ApiError::DetectionFailed => "Detection failed",
        }
    }
}

impl From<CountFingersError> for ApiError {
    fn from(err: CountFingersError) -> Self {
        match err {
            CountFingersError::Payload(e) => {
                log::warn!("Rejected payload: {e}");
                ApiError::InvalidImage
            }
            CountFingersError::Decode(e) => {
                log::warn!("Rejected image: {e}");
                ApiError::InvalidImage
            }
            CountFingersError::Storage(e) => {
                log::error!("{e}");
                ApiError::DetectionFailed
            }
            CountFingersError::Detection(e) => {
                log::error!("Detection failed: {e}");
                ApiError::DetectionFailed
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.message().to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
