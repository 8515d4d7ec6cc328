//! Core domain logic for reference-sheet generation.
//!
//! Everything here is deterministic: record types, style and cinematography
//! resolution, prompt composition, reference-set planning and the sidecar
//! migration rules. Filesystem access is confined to [`store`] and
//! [`catalog`]; the capability clients live in `move37-genai`.

pub mod catalog;
pub mod cinematography;
pub mod composer;
pub mod error;
pub mod migration;
pub mod naming;
pub mod planner;
pub mod records;
pub mod reference;
pub mod source;
pub mod store;
pub mod style;
