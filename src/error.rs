//! Error types for pipeline-init operations.
//!
//! This module defines [`InitError`], the primary error type used throughout
//! the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Use `InitError` for domain-specific errors that need distinct handling
//! - Use `anyhow::Error` (via `InitError::Other`) for unexpected errors
//! - Detection findings that are not fatal are warnings, not errors

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for pipeline-init operations.
#[derive(Debug, Error)]
pub enum InitError {
    /// Walking the repository failed (permission denied, unreadable entry).
    #[error("Failed to scan {path}: {message}")]
    Walk { path: PathBuf, message: String },

    /// Resolution reached a question whose answer has no matching branch.
    #[error("No configuration selected")]
    NoConfigSelected,

    /// A resolved leaf names a configuration the platform does not provide.
    #[error("Unknown configuration '{config_id}' for platform '{platform}'")]
    UnknownConfiguration { platform: String, config_id: String },

    /// An option tree references a configuration missing from its template map.
    #[error("Option tree of '{platform}' references missing configuration '{config_id}'")]
    TemplateMismatch { platform: String, config_id: String },

    /// An option tree was built with an invalid shape.
    #[error("Invalid option tree: {message}")]
    InvalidTree { message: String },

    /// Pipeline template text could not be parsed or rendered.
    #[error("Invalid pipeline template: {message}")]
    TemplateParse { message: String },

    /// Requested platform is not part of the scan result.
    #[error("Unknown platform: {name}")]
    UnknownPlatform { name: String },

    /// The step catalog is missing or does not know a step.
    #[error("Step catalog error: {message}")]
    CatalogError { message: String },

    /// A question could not be answered without a terminal.
    #[error("Cannot answer '{key}' in non-interactive mode (no default value)")]
    PromptUnavailable { key: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for pipeline-init operations.
pub type Result<T> = std::result::Result<T, InitError>;
