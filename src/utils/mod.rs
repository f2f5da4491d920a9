//! Small shared helpers: protocol constants and JSON inspection.

pub mod constants;
pub mod json;

pub use constants::*;
pub use json::*;
