//! HTTP surface: the landing page and the prediction endpoint.

use crate::application::prediction::{PredictionResult, PredictionService};
use crate::domain::errors::PipelineError;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, warn};

const INDEX_HTML: &str = include_str!("../../static/index.html");

pub type AppState = Arc<PredictionService>;

pub fn router(service: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/predict/{symbol}", get(predict))
        .with_state(service)
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn predict(
    State(service): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<PredictionResult>, ApiError> {
    let result = service.predict(&symbol).await?;
    Ok(Json(result))
}

/// Maps pipeline failures to `{"error": ...}` with 400 for input problems
/// and 500 for everything else.
#[derive(Debug)]
pub struct ApiError(pub PipelineError);

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("HTTP: prediction failed: {}", self.0);
        } else {
            warn!("HTTP: rejected prediction request: {}", self.0);
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError(PipelineError::NoData).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError(PipelineError::DegenerateRange { min: 1.0, max: 1.0 }).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError(PipelineError::Unexpected("boom".to_string())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_index_serves_landing_page() {
        let Html(body) = index().await;
        assert!(body.contains("/predict/"));
    }
}
