use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::metric::WeightMetric;

/// Convenient result alias for the railnet library.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification used by callers to decide how to degrade an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Expected outcome; reported as information rather than failure.
    NotFound,
    /// Projection build or lookup failed; retryable.
    Projection,
    /// Shortest-path computation aborted.
    Computation,
    /// Store unreachable or the pool could not hand out a connection.
    Connectivity,
    /// Input rejected before touching the store.
    Validation,
}

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Raised when a weight metric name is not one of the recognized edge properties.
    #[error("unknown weight metric '{value}'; expected one of: length, travel-time")]
    UnknownMetric { value: String },

    /// Raised when a configuration value could not be parsed.
    #[error("invalid configuration value for {key}: {message}")]
    InvalidConfig { key: String, message: String },

    /// Raised when a station name could not be resolved to an operation point.
    #[error("unknown station name: {name}{}", format_suggestions(.suggestions))]
    UnknownStation {
        name: String,
        suggestions: Vec<String>,
    },

    /// Raised when a shortest-path run is attempted before the projection exists.
    #[error("no projection exists for metric {metric}")]
    ProjectionMissing { metric: WeightMetric },

    /// Raised when the store rejected a projection build.
    #[error("failed to build projection for metric {metric}: {message}")]
    ProjectionBuild {
        metric: WeightMetric,
        message: String,
    },

    /// Raised when an endpoint is not part of the projection.
    #[error("operation point {id} is not part of the {metric} projection")]
    NodeNotInProjection { id: String, metric: WeightMetric },

    /// Raised when the path computation itself failed.
    #[error("shortest path computation failed: {message}")]
    Computation { message: String },

    /// Raised when a store round trip or computation ran past its deadline.
    #[error("deadline exceeded while {operation}")]
    DeadlineExceeded { operation: &'static str },

    /// Raised when the graph store file does not exist.
    #[error("graph store not found at {path}")]
    StoreNotFound { path: PathBuf },

    /// Raised when the store lacks a table the queries depend on.
    #[error("unsupported graph store schema; missing table {table}")]
    UnsupportedSchema { table: String },

    /// No suitable project directories could be resolved for this platform.
    #[error("failed to resolve project directories for the default graph store")]
    ProjectDirsUnavailable,

    /// Wrapper for connection pool errors (checkout timeout, failed connects).
    #[error("graph store connection unavailable: {0}")]
    Pool(#[from] r2d2::Error),

    /// Wrapper for SQLite errors.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Map the error onto the coarse taxonomy used by the orchestration layer.
    pub fn class(&self) -> ErrorClass {
        match self {
            Error::UnknownStation { .. } => ErrorClass::NotFound,
            Error::ProjectionMissing { .. } | Error::ProjectionBuild { .. } => {
                ErrorClass::Projection
            }
            Error::NodeNotInProjection { .. }
            | Error::Computation { .. }
            | Error::DeadlineExceeded { .. } => ErrorClass::Computation,
            Error::UnknownMetric { .. } | Error::InvalidConfig { .. } => ErrorClass::Validation,
            Error::StoreNotFound { .. }
            | Error::UnsupportedSchema { .. }
            | Error::ProjectDirsUnavailable
            | Error::Pool(_)
            | Error::Sqlite(_)
            | Error::Io(_) => ErrorClass::Connectivity,
        }
    }

    /// Whether the orchestrator may degrade this error to "no path found".
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.class(),
            ErrorClass::NotFound | ErrorClass::Projection | ErrorClass::Computation
        )
    }

    pub(crate) fn from_sqlite(err: rusqlite::Error, operation: &'static str) -> Self {
        if err.sqlite_error_code() == Some(rusqlite::ErrorCode::OperationInterrupted) {
            Error::DeadlineExceeded { operation }
        } else {
            Error::Sqlite(err)
        }
    }
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else if suggestions.len() == 1 {
        format!(". Did you mean '{}'?", suggestions[0])
    } else {
        format!(
            ". Did you mean one of: {}?",
            suggestions
                .iter()
                .map(|s| format!("'{}'", s))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}
