//! Error types for the feed pipeline
//!
//! This module defines the error types raised by the fetch, parse and
//! mapping stages of a refresh.

use thiserror::Error;

/// Errors that can occur while fetching the feed
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport-level HTTP failure
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Network error: {code} {reason}")]
    Status { code: u16, reason: String },

    /// Request timeout
    #[error("Network error: request timed out")]
    Timeout,

    /// Superseded by a newer fetch
    #[error("Fetch cancelled")]
    Cancelled,

    /// Invalid feed URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Build a status error from an HTTP status code
    pub fn status(status: reqwest::StatusCode) -> Self {
        Self::Status {
            code: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
        }
    }

    /// Classify a reqwest error, separating timeouts from other transport failures
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }

    /// Whether this error came from the attempt being superseded
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Errors raised by a single row parsing strategy
#[derive(Error, Debug)]
pub enum RowParseError {
    /// The delimited-text reader rejected the input
    #[error("Delimited reader failed: {0}")]
    Reader(#[from] csv::Error),

    /// No strategy was configured
    #[error("No row parsing strategy configured")]
    NoStrategy,
}

/// Errors raised while mapping rows into records
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    /// One or more required headers are absent
    #[error("Missing expected column header(s): {}.", .0.join(", "))]
    MissingColumns(Vec<String>),
}

impl MappingError {
    /// Names of the missing required fields
    pub fn missing_fields(&self) -> &[String] {
        match self {
            Self::MissingColumns(fields) => fields,
        }
    }
}

/// Errors from one full pipeline run (fetch, parse, map)
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Fetch error
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Row parse error
    #[error("Parse error: {0}")]
    Parse(#[from] RowParseError),

    /// Mapping (validation) error
    #[error(transparent)]
    Mapping(#[from] MappingError),
}

impl PipelineError {
    /// Whether the run ended because a newer run superseded it
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Fetch(e) if e.is_cancelled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_names_every_field() {
        let err = MappingError::MissingColumns(vec!["date".into(), "time".into()]);
        assert_eq!(
            err.to_string(),
            "Missing expected column header(s): date, time."
        );
        assert_eq!(err.missing_fields().len(), 2);
    }

    #[test]
    fn test_status_error_message() {
        let err = FetchError::status(reqwest::StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.to_string(), "Network error: 503 Service Unavailable");
    }

    #[test]
    fn test_cancelled_detection() {
        let err: PipelineError = FetchError::Cancelled.into();
        assert!(err.is_cancelled());

        let err: PipelineError = MappingError::MissingColumns(vec!["time".into()]).into();
        assert!(!err.is_cancelled());
    }
}
