use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use axum::extract::{DefaultBodyLimit, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::multipart::MultipartRejection;
use axum_extra::extract::Multipart;
use tower_http::cors::CorsLayer;

use finger_count_core::imaging::domain::image_payload::ImagePayload;
use finger_count_core::pipeline::count_fingers_use_case::CountFingersUseCase;

use crate::response::{AnalyzeResponse, ApiError, HealthResponse};

/// Text field carrying a data URL from a camera capture.
const IMAGE_FIELD: &str = "image";
/// File field carrying a raw upload.
const FILE_FIELD: &str = "file";

#[derive(Clone)]
pub struct AppState {
    use_case: Arc<Mutex<CountFingersUseCase>>,
}

impl AppState {
    pub fn new(use_case: CountFingersUseCase) -> Self {
        Self {
            use_case: Arc::new(Mutex::new(use_case)),
        }
    }
}

pub fn router(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .route("/analyze", post(analyze))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn analyze(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let multipart = multipart.map_err(|e| {
        log::warn!("Request is not multipart: {e}");
        ApiError::NoImage
    })?;
    let payload = read_payload(multipart).await?;

    let start = Instant::now();
    let use_case = Arc::clone(&state.use_case);
    let report = tokio::task::spawn_blocking(move || {
        let mut use_case = use_case.lock().unwrap_or_else(PoisonError::into_inner);
        use_case.execute(payload)
    })
    .await
    .map_err(|e| {
        log::error!("Inference task failed: {e}");
        ApiError::DetectionFailed
    })??;

    log::info!(
        "Counted {} finger(s), hand detected: {}, {}x{} in {:.1}ms",
        report.outcome.fingers(),
        report.outcome.hand_detected(),
        report.width,
        report.height,
        start.elapsed().as_secs_f64() * 1000.0
    );
    Ok(Json(AnalyzeResponse::from(&report)))
}

/// Picks the `image` data URL if present, else the `file` upload.
async fn read_payload(mut multipart: Multipart) -> Result<ImagePayload, ApiError> {
    let mut data_url = None;
    let mut file = None;

    let malformed = |e: axum_extra::extract::multipart::MultipartError| {
        log::warn!("Malformed multipart body: {e}");
        ApiError::InvalidImage
    };

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().map(str::to_owned);
        let is_file = field.file_name().is_some();
        match name.as_deref() {
            Some(IMAGE_FIELD) if !is_file => {
                data_url = Some(field.text().await.map_err(malformed)?);
            }
            Some(FILE_FIELD) => {
                file = Some(field.bytes().await.map_err(malformed)?.to_vec());
            }
            _ => {}
        }
    }

    match (data_url, file) {
        (Some(url), _) => Ok(ImagePayload::DataUrl(url)),
        (None, Some(bytes)) => Ok(ImagePayload::Bytes(bytes)),
        (None, None) => Err(ApiError::NoImage),
    }
}
