//! CLI command implementations.

pub mod address;
pub mod fields;
pub mod generate;
pub mod ranges;
pub mod system;
