//! In-memory trace model.
//!
//! # Module Organization
//!
//! - [`models`]: `Call`, `Frame`, `Trace` and the file metadata they carry
//! - [`constants`]: Shared limits and defaults

pub mod constants;
pub mod models;

pub use models::*;
