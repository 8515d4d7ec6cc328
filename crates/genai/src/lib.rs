//! Clients for the external generation capabilities.
//!
//! The orchestrator only sees the [`ImageGenerator`] and [`TextGenerator`]
//! traits; [`ImagenClient`] and [`GeminiClient`] are the production
//! implementations over the Google Generative Language REST API. Clients
//! are constructed explicitly from a [`GenAiConfig`] and injected.

pub mod config;
pub mod error;
mod http;
pub mod image;
pub mod text;

pub use config::GenAiConfig;
pub use error::GenAiError;
pub use image::{GeneratedImage, ImageGenerator, ImageRequest, ImagenClient};
pub use text::{GeminiClient, TextGenerator};
