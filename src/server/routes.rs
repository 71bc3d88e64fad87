//! HTTP endpoints: prediction and health.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::Value;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::AppState;
use crate::error::RequestError;
use crate::model::{ModelInfo, Prediction};

/// Message returned for any server-side failure.
const GENERIC_ERROR: &str = "An error occurred while processing your request. Please try again.";

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Build the Axum router with the prediction and health routes.
pub fn app_routes(state: AppState) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/health", get(health))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::NoData | Self::EmptyText | Self::NotText | Self::TooShort { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = match self {
            Self::Internal(_) => GENERIC_ERROR.to_string(),
            other => other.to_string(),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

// ── Validation ──────────────────────────────────────────────────────────

/// Extract the trimmed `email_text` from a request body.
///
/// A missing, `null`, empty, or non-object body counts as no data.
pub fn validate_submission(body: &Value, min_chars: usize) -> Result<&str, RequestError> {
    let fields = match body.as_object() {
        Some(fields) if !fields.is_empty() => fields,
        _ => return Err(RequestError::NoData),
    };

    let text = match fields.get("email_text") {
        None | Some(Value::Null) => return Err(RequestError::EmptyText),
        Some(Value::String(text)) => text.trim(),
        Some(_) => return Err(RequestError::NotText),
    };

    if text.is_empty() {
        return Err(RequestError::EmptyText);
    }
    if text.chars().count() < min_chars {
        return Err(RequestError::TooShort { min_chars });
    }
    Ok(text)
}

// ── Predict ─────────────────────────────────────────────────────────────

async fn predict(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Prediction>, RequestError> {
    let Json(body) = body.map_err(|rejection| {
        debug!(error = %rejection, "Rejected request body");
        match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => RequestError::TooLarge {
                limit_bytes: MAX_BODY_BYTES,
            },
            _ => RequestError::NoData,
        }
    })?;
    let text = validate_submission(&body, state.min_chars)?;

    let model = state.model.get().ok_or(RequestError::ModelUnavailable)?;
    let normalized = model.preprocessor().normalize(text);

    let request_id = Uuid::new_v4();
    let prediction = model.predict(&normalized).map_err(|e| {
        error!(request_id = %request_id, error = %e, "Prediction failed");
        RequestError::Internal(e.to_string())
    })?;

    info!(
        request_id = %request_id,
        prediction = %prediction.label,
        confidence = prediction.confidence,
        chars = text.chars().count(),
        "Prediction served"
    );
    Ok(Json(prediction))
}

// ── Health ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    #[serde(flatten)]
    model: ModelInfo,
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        model: state.model.info(),
    })
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({"error": "Endpoint not found"})),
    )
}
