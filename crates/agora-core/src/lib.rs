//! Agora Core — shared types, errors, and utilities.
//!
//! This crate provides the foundational types used across all Agora crates.
//! It has no internal Agora dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`util`]: HTML stripping, slug, and timestamp utilities

pub mod error;
pub mod util;

// Re-export key types at crate root for convenience
pub use error::{Error, Result};

// Convenience re-exports from util
pub use util::html::strip_html;
pub use util::ids::slugify;
pub use util::time::to_timestamp;
