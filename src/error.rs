//! Custom error types for the dashboard data pipeline.
//!
//! This module provides the error hierarchy using `thiserror`. The taxonomy
//! follows the pipeline's failure model: a missing source file is fatal for
//! the view that needs it, unparseable field values are coerced to null at
//! the loader level and never surface here, and an empty filtered result is
//! not an error at all.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the dashboard pipeline.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// A source file for a view could not be found. Fatal for that view only.
    #[error("Source file not found: {0}")]
    SourceNotFound(PathBuf),

    /// Column was not found in the loaded table.
    #[error("Column '{0}' not found in table")]
    ColumnNotFound(String),

    /// A range constraint with lower bound above upper bound.
    #[error("Invalid bounds for '{field}': lower {lower} exceeds upper {upper}")]
    InvalidBounds {
        field: String,
        lower: String,
        upper: String,
    },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A control endpoint was requested for a field with no observed values.
    #[error("No observed values in column '{0}' to derive a control range")]
    EmptyDomain(String),

    /// A pivot was requested over a column with an unsupported dtype.
    #[error("Cannot aggregate column '{column}' as {role}: {reason}")]
    UnsupportedAggregation {
        column: String,
        role: String,
        reason: String,
    },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP error from the one-time dataset download.
    #[error("Download error: {0}")]
    Download(#[from] reqwest::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<DashboardError>,
    },
}

impl DashboardError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        DashboardError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Whether this error means a source file is absent (fatal per view).
    pub fn is_missing_source(&self) -> bool {
        match self {
            Self::SourceNotFound(_) => true,
            Self::WithContext { source, .. } => source.is_missing_source(),
            _ => false,
        }
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, DashboardError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| DashboardError::Polars(e).with_context(context))
    }
}
