//! Shared utilities.
//!
//! This module provides:
//! - CSS selector parsing with safe fallbacks
//! - Text sanitization for dataset output

pub mod sanitize;
mod selector;

pub use selector::{parse_selector_unsafe, parse_selector_with_fallback};
