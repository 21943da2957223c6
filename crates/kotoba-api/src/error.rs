use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kotoba_practice::PracticeError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Practice(#[from] PracticeError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let Self::Practice(err) = self;
        let (status, message) = match &err {
            PracticeError::DeckNotFound(_) | PracticeError::EntryNotFound(_) => {
                (StatusCode::NOT_FOUND, err.to_string())
            }
            PracticeError::DeckMismatch { .. } | PracticeError::InvalidTimezone(_) => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            PracticeError::CorruptLabel(_) | PracticeError::Database(_) => {
                tracing::error!(error = %err, "practice operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                )
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
