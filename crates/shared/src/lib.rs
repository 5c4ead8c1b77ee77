//! Shared library for the video generator workspace.
//!
//! This crate provides common functionality used by the generator crate:
//! - Configuration management
//! - Data models exchanged with video backends
//! - Logging infrastructure
//! - Shared error types

pub mod config;
pub mod error;
pub mod logging;
pub mod models;

// Re-export commonly used types
pub use config::{BackendMode, Config};
pub use error::GenerationError;
pub use logging::LogConfig;
pub use models::*;

/// Common result type using anyhow::Error
pub type Result<T> = anyhow::Result<T>;
