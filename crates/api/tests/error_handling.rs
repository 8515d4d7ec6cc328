//! Tests for `AppError` → HTTP response mapping.
//!
//! These call `IntoResponse` directly on `AppError` values; no server needed.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use move37_api::error::AppError;
use move37_core::error::CoreError;
use move37_genai::GenAiError;
use move37_pipeline::PipelineError;

/// Helper: convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn not_found_error_returns_404() {
    let err = AppError::Core(CoreError::not_found("Character", "kaelen"));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Character with id kaelen not found");
}

#[tokio::test]
async fn invalid_argument_returns_400() {
    let err = AppError::Core(CoreError::InvalidArgument("Unknown reference angle 'x'".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INVALID_ARGUMENT");
    assert_eq!(json["error"], "Unknown reference angle 'x'");
}

#[tokio::test]
async fn upstream_error_returns_500_with_detail() {
    let err = AppError::from(PipelineError::Upstream(GenAiError::Api {
        status: 503,
        body: "model overloaded".into(),
    }));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "UPSTREAM_ERROR");
    assert!(json["error"].as_str().unwrap().contains("model overloaded"));
}

#[tokio::test]
async fn io_error_returns_500_with_detail() {
    let err = AppError::Core(CoreError::Io(std::io::Error::new(
        std::io::ErrorKind::PermissionDenied,
        "characters/ is not writable",
    )));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "I/O error: characters/ is not writable");
}

#[tokio::test]
async fn malformed_json_returns_500_with_detail() {
    let parse_error = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
    let err = AppError::Core(CoreError::Serialization(parse_error));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert!(json["error"].as_str().unwrap().starts_with("Malformed JSON:"));
}
