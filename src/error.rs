//! Error types for the area load engine
//!
//! Geometry and definition errors are fatal for the load instance being
//! computed; `ElementNotFound` is fatal for a single element only. Weight
//! drift is not an error and is reported through
//! [`Diagnostic`](crate::loads::Diagnostic) instead.

use thiserror::Error;

/// Error types for area load computation
#[derive(Error, Debug)]
pub enum AreaLoadError {
    /// A direction, normal or axis vector is zero-length or non-finite
    #[error("Invalid direction: {0}")]
    InvalidDirection(String),

    /// Zero-area face, zero-length edge or malformed boundary loop
    ///
    /// Raised while building a [`Surface`](crate::mesh::Surface), before any
    /// pressure projection takes place.
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// The distribution method could not find enough supporting edges
    ///
    /// For one-way distribution this means fewer than two edges lie within
    /// the angular tolerance of perpendicular to the transfer axis and the
    /// even-distribution fallback is disabled.
    #[error("Insufficient edges: {0}")]
    InsufficientEdges(String),

    /// An element lacks complete corner-node topology
    #[error("Element {element_id} not found: {reason}")]
    ElementNotFound { element_id: usize, reason: String },

    /// Configuration error
    ///
    /// Invalid configuration file format, missing required fields,
    /// or invalid parameter combinations.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AreaLoadError {
    /// Short invariant name used in diagnostics and reports
    pub fn kind(&self) -> &'static str {
        match self {
            AreaLoadError::InvalidDirection(_) => "InvalidDirection",
            AreaLoadError::DegenerateGeometry(_) => "DegenerateGeometry",
            AreaLoadError::InsufficientEdges(_) => "InsufficientEdges",
            AreaLoadError::ElementNotFound { .. } => "ElementNotFound",
            AreaLoadError::ConfigError(_) => "ConfigError",
            AreaLoadError::IoError(_) => "IoError",
        }
    }
}

/// Convenience type alias for Results with [`AreaLoadError`]
///
/// # Example
/// ```
/// use area_load_engine::Result;
///
/// fn my_function() -> Result<()> {
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, AreaLoadError>;
