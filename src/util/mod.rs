//! Utility functions for common operations.
//!
//! Text processing helpers for terminal rendering: Unicode-aware width
//! calculation and truncation, and control-character stripping for values
//! that come back from the store or the generator.

mod text;

pub use text::{display_width, strip_control_chars, truncate_to_width};
