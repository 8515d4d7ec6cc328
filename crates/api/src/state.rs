use std::sync::Arc;

use move37_core::store::DataStore;
use move37_genai::TextGenerator;
use move37_pipeline::ReferenceGenerator;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Data store rooted at the configured data root.
    pub store: DataStore,
    /// Reference orchestrator (owns the image capability).
    pub references: Arc<ReferenceGenerator>,
    /// Structured text capability for character sheets.
    pub text: Arc<dyn TextGenerator>,
}
