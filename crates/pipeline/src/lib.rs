//! Reference generation orchestration.
//!
//! Drives the planner from `move37-core`, calls the injected image
//! capability for every angle that needs it, writes the images and
//! rewrites the record's sidecar. Also turns free-text character
//! descriptions into character sheets through the text capability.

pub mod character_sheet;
pub mod error;
pub mod references;
pub mod throttle;

pub use error::PipelineError;
pub use references::{CharacterReferenceRequest, ReferenceGenerator, ReferencePaths, RenderedSheet};
pub use throttle::ThrottlePolicy;
