//! Core module - shared infrastructure for docs-differ
//!
//! This module contains foundational types, configuration, and error handling
//! used throughout the application.

pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::{DifferError, NavigationErrorKind, Result};
pub use types::*;
