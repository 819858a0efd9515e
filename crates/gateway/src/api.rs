use crate::decode::decode_image;
use crate::state::AppState;
use axum::{
    Router,
    extract::{
        DefaultBodyLimit, Multipart, State, multipart::MultipartRejection,
        rejection::JsonRejection,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use base64::Engine as _;
use detector::DetectionBatch;
use fusion::{FusionError, FusionReport};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub const DETECT_ROUTE: &str = "/detect";
pub const UPLOAD_ROUTE: &str = "/upload";
pub const HEALTH_ROUTE: &str = "/health";

const FILE_FIELD: &str = "file";
const UPLOAD_MESSAGE: &str = "Object detection complete";

/// POST /upload request body.
#[derive(Deserialize)]
pub struct UploadRequest {
    /// Standard base64 of the encoded image.
    pub image: String,
}

/// POST /detect response.
#[derive(Serialize)]
pub struct DetectResponse {
    pub detections: DetectionBatch,
}

/// POST /upload response.
#[derive(Serialize)]
pub struct UploadResponse {
    pub message: &'static str,
    pub detections: DetectionBatch,
}

/// GET /health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: f64,
    pub models: Vec<String>,
    pub vocabulary_size: usize,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Error returned to the client as `{"error": ...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::debug!(error = %message, "Rejected request");
        Self {
            status: StatusCode::BAD_REQUEST,
            message,
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::error!(error = %message, "Internal error");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message,
        }
    }

    /// Malformed requests are 400, except bodies over the size limit, which stay 413.
    fn rejected(status: StatusCode, message: String) -> Self {
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            tracing::debug!(error = %message, "Rejected oversized request");
            Self { status, message }
        } else {
            Self::bad_request(message)
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

impl From<FusionError> for ApiError {
    fn from(err: FusionError) -> Self {
        ApiError::internal(err.to_string())
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let max_body_bytes = state.max_body_bytes;

    Router::new()
        .route(DETECT_ROUTE, post(detect_multipart))
        .route(UPLOAD_ROUTE, post(detect_base64))
        .route(HEALTH_ROUTE, get(health))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// POST /detect, multipart/form-data with a `file` field.
async fn detect_multipart(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<DetectResponse>, ApiError> {
    let started = Instant::now();

    let bytes = match multipart {
        Ok(multipart) => read_file_field(multipart).await,
        Err(rejection) => Err(ApiError::rejected(rejection.status(), rejection.body_text())),
    };
    let result = match bytes {
        Ok(bytes) => run_detection(&state, bytes).await,
        Err(err) => Err(err),
    };

    record(&state, DETECT_ROUTE, started, &result);
    result.map(|detections| Json(DetectResponse { detections }))
}

/// POST /upload, JSON with a base64 `image`.
async fn detect_base64(
    State(state): State<Arc<AppState>>,
    request: Result<Json<UploadRequest>, JsonRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let started = Instant::now();

    let bytes = match request {
        Ok(Json(request)) => base64::engine::general_purpose::STANDARD
            .decode(request.image.trim())
            .map_err(|e| ApiError::bad_request(format!("Invalid base64: {e}"))),
        Err(rejection) => Err(ApiError::rejected(rejection.status(), rejection.body_text())),
    };
    let result = match bytes {
        Ok(bytes) => run_detection(&state, bytes).await,
        Err(err) => Err(err),
    };

    record(&state, UPLOAD_ROUTE, started, &result);
    result.map(|detections| {
        Json(UploadResponse {
            message: UPLOAD_MESSAGE,
            detections,
        })
    })
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.start_time.elapsed().as_secs_f64(),
        models: state.engine.models().map(str::to_string).collect(),
        vocabulary_size: state.classes.len(),
    })
}

async fn read_file_field(mut multipart: Multipart) -> Result<Vec<u8>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::rejected(e.status(), format!("Multipart error: {e}")))?
    {
        if field.name() == Some(FILE_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::rejected(e.status(), format!("File read error: {e}")))?;
            return Ok(bytes.to_vec());
        }
    }

    Err(ApiError::bad_request(format!("Missing '{FILE_FIELD}' field")))
}

/// Decode and detect on the blocking pool; the engine call is synchronous and CPU bound.
async fn run_detection(state: &Arc<AppState>, bytes: Vec<u8>) -> Result<DetectionBatch, ApiError> {
    let engine = Arc::clone(&state.engine);

    let outcome = tokio::task::spawn_blocking(
        move || -> Result<Result<FusionReport, FusionError>, ApiError> {
            let image =
                decode_image(&bytes).map_err(|e| ApiError::bad_request(format!("{e:#}")))?;
            tracing::debug!(width = image.width(), height = image.height(), "Decoded image");
            Ok(engine.detect(&image))
        },
    )
    .await
    .map_err(|e| ApiError::internal(format!("Detection task failed: {e}")))??;

    match outcome {
        Ok(report) => {
            state.metrics.record_report(&report);
            Ok(report.detections)
        }
        Err(err) => {
            state.metrics.record_error(&err);
            Err(err.into())
        }
    }
}

fn record<T>(state: &AppState, route: &'static str, started: Instant, result: &Result<T, ApiError>) {
    let status = match result {
        Ok(_) => StatusCode::OK,
        Err(err) => err.status,
    };
    state.metrics.record_request(route, status, started.elapsed());
}
