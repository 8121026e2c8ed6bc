//! CLI command implementations.

pub mod check;
pub mod params;
pub mod render;
