//! Utility modules shared across the Agora crates.

pub mod html;
pub mod ids;
pub mod time;
