use move37_core::error::CoreError;
use move37_genai::GenAiError;

/// Errors from the orchestration layer.
///
/// Both variants are transparent: domain and upstream errors reach the
/// caller exactly as their source produced them.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// NotFound / InvalidArgument / storage errors from the core crate.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A generation capability failed or answered with unusable output.
    #[error(transparent)]
    Upstream(#[from] GenAiError),
}
