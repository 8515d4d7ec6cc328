//! Route definitions for the asset listing and raw record access.

use axum::routing::get;
use axum::Router;

use crate::handlers::data;
use crate::state::AppState;

/// Catalog routes mounted at the root.
///
/// ```text
/// GET  /assets                     -> list_assets
/// GET  /files/{category}           -> list_files
/// GET  /data/{category}/{filename} -> read_record
/// POST /data/{category}/{filename} -> write_record
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/assets", get(data::list_assets))
        .route("/files/{category}", get(data::list_files))
        .route(
            "/data/{category}/{filename}",
            get(data::read_record).post(data::write_record),
        )
}
