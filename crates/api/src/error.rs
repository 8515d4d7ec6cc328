use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use move37_core::error::CoreError;
use move37_genai::GenAiError;
use move37_pipeline::PipelineError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and [`GenAiError`] for upstream
/// capability failures. Implements [`IntoResponse`] to produce consistent
/// JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `move37_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An image or text generation call failed.
    #[error(transparent)]
    Upstream(#[from] GenAiError),
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Core(core) => Self::Core(core),
            PipelineError::Upstream(upstream) => Self::Upstream(upstream),
        }
    }
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::InvalidArgument(msg) => {
                    (StatusCode::BAD_REQUEST, "INVALID_ARGUMENT", msg.clone())
                }
                CoreError::Io(_) | CoreError::Serialization(_) => {
                    tracing::error!(error = %core, "Storage error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        core.to_string(),
                    )
                }
            },

            // --- Upstream capability errors (detail is surfaced) ---
            AppError::Upstream(err) => {
                tracing::error!(error = %err, "Generation capability failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "UPSTREAM_ERROR",
                    err.to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
