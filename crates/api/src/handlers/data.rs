//! Handlers for the asset listing and raw record access.
//!
//! Records are passed through as text: reads return the file verbatim and
//! writes only check that the body parses as JSON.

use axum::extract::{Path, State};
use axum::Json;
use move37_core::catalog::{self, AssetEntry};
use serde::Serialize;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// A raw record as stored on disk.
#[derive(Debug, Serialize)]
pub struct RecordContent {
    pub filename: String,
    pub content: String,
}

/// Acknowledgement of a record write.
#[derive(Debug, Serialize)]
pub struct RecordWritten {
    pub category: String,
    pub filename: String,
}

/// GET /assets
pub async fn list_assets(State(state): State<AppState>) -> Json<DataResponse<Vec<AssetEntry>>> {
    Json(DataResponse {
        data: catalog::list_assets(state.store.root()),
    })
}

/// GET /files/{category}
pub async fn list_files(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> AppResult<Json<DataResponse<Vec<String>>>> {
    let files = catalog::list_records(state.store.root(), &category)?;
    Ok(Json(DataResponse { data: files }))
}

/// GET /data/{category}/{filename}
pub async fn read_record(
    State(state): State<AppState>,
    Path((category, filename)): Path<(String, String)>,
) -> AppResult<Json<DataResponse<RecordContent>>> {
    let content = catalog::read_record(state.store.root(), &category, &filename)?;
    Ok(Json(DataResponse {
        data: RecordContent { filename, content },
    }))
}

/// POST /data/{category}/{filename}
///
/// The request body is the record itself.
pub async fn write_record(
    State(state): State<AppState>,
    Path((category, filename)): Path<(String, String)>,
    body: String,
) -> AppResult<Json<DataResponse<RecordWritten>>> {
    catalog::write_record(state.store.root(), &category, &filename, &body)?;
    Ok(Json(DataResponse {
        data: RecordWritten { category, filename },
    }))
}
