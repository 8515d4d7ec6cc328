//! Route definitions for reference and character sheet generation.
//!
//! All routes are mounted under `/generate`.

use axum::routing::post;
use axum::Router;

use crate::handlers::generation;
use crate::state::AppState;

/// Generation routes mounted at `/generate`.
///
/// ```text
/// POST /character      -> generate_character
/// POST /environment    -> generate_environment
/// POST /character-json -> generate_character_json
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/character", post(generation::generate_character))
        .route("/environment", post(generation::generate_environment))
        .route("/character-json", post(generation::generate_character_json))
}
