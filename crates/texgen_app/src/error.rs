// SPDX-License-Identifier: MIT OR Apache-2.0
//! Application errors.

use texgen_graph::{BackendError, GraphError};
use thiserror::Error;

/// Errors surfaced by the application
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// RON parse error
    #[error("Failed to parse {path}: {reason}")]
    Parse {
        /// File being read
        path: String,
        /// Parser message
        reason: String,
    },

    /// RON serialization error
    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),

    /// Image encoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Backend error
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Graph error
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Saved layout refers to something that does not exist
    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    /// Renderer initialization failed
    #[error("Failed to initialize renderer: {0}")]
    RendererInit(String),
}

/// Result type for application operations
pub type Result<T> = std::result::Result<T, AppError>;
