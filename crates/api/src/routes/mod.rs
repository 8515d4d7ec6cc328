pub mod data;
pub mod generation;
pub mod health;

use axum::routing::post;
use axum::Router;

use crate::handlers::generation::batch_render;
use crate::state::AppState;

/// Build the API route tree.
///
/// Route hierarchy:
///
/// ```text
/// /generate/character                  generate character references (POST)
/// /generate/environment                generate environment references (POST)
/// /generate/character-json             character sheet from free text (POST)
/// /batch-render                        render every character sheet (POST)
///
/// /assets                              list images and videos under the data root
/// /files/{category}                    list JSON records of a category
/// /data/{category}/{filename}          read (GET), write (POST) a raw record
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/generate", generation::router())
        .route("/batch-render", post(batch_render))
        .merge(data::router())
}
