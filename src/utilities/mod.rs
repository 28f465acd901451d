//! Shared utilities.

pub mod clock;
pub mod errors;
