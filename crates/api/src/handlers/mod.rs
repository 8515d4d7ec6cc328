pub mod data;
pub mod generation;
