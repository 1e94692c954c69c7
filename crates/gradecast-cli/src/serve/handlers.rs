use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use gradecast_classifiers::data_handling::FeatureVector;

use crate::serve::state::AppState;

/// JSON error body: `{"detail": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

pub fn api_error(status: StatusCode, message: &str) -> Response {
    let body = ErrorBody {
        detail: message.to_string(),
    };
    (status, Json(body)).into_response()
}

/// `GET /`
pub async fn root_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "message": "Student pass/fail predictor",
        "docs": "POST /predict with weekly_self_study_hours, attendance_percentage, class_participation and total_score; GET /health for liveness",
        "model_loaded": state.model_loaded(),
    }))
}

/// `GET /health`. Never looks at the model.
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// `POST /predict`
///
/// 503 while no model is loaded, the rejection's own status (422, 400 or 415)
/// for a body that is not a valid feature vector, 500 when inference fails.
pub async fn predict_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<FeatureVector>, JsonRejection>,
) -> Response {
    let Some(pipeline) = state.model.as_ref() else {
        return api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            &format!(
                "Model not loaded. Train one and place it at {}",
                state.model_path.display()
            ),
        );
    };

    let Json(features) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            log::debug!("Rejected prediction request: {}", rejection.body_text());
            return api_error(rejection.status(), &rejection.body_text());
        }
    };

    match pipeline.predict_one(&features) {
        Ok(prediction) => {
            log::debug!(
                "Predicted {} (p = {:.4}) for {:?}",
                prediction.label,
                prediction.probability,
                features.to_array()
            );
            Json(prediction).into_response()
        }
        Err(e) => {
            log::error!("Prediction failed: {}", e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}
