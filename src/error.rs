//! Unified error handling for the delivery_board crate
//!
//! This module provides a unified error type that consolidates all domain-specific
//! errors into a single `Error` enum, while maintaining the ability to use
//! domain-specific errors when needed.
//!
//! # Architecture
//!
//! - [`BoardErrorTrait`] - Common interface implemented by all error types
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! # Usage
//!
//! ```rust,ignore
//! use delivery_board::error::{BoardErrorTrait, Error};
//!
//! fn handle_error(err: Error) {
//!     if err.is_recoverable() {
//!         println!("Will retry on the next refresh: {err}");
//!     } else {
//!         eprintln!("Fatal error: {err}");
//!     }
//! }
//! ```

use thiserror::Error;

// Re-export domain-specific errors for convenience
pub use crate::scheduler::error::SchedulerError;
pub use crate::utils::error::{FetchError, MappingError, PipelineError, RowParseError};

/// Common trait for all delivery_board error types
pub trait BoardErrorTrait: std::error::Error {
    /// Check if this error is recoverable (a later refresh may succeed)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// HTTP status, transport and timeout errors
    Network,
    /// Row parsing errors
    Parsing,
    /// Missing columns and other feed shape problems
    Validation,
    /// Configuration errors
    Config,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Parsing => "parsing",
            Self::Validation => "validation",
            Self::Config => "config",
            Self::Other => "other",
        }
    }
}

impl BoardErrorTrait for FetchError {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout => true,
            // 5xx and 429 tend to clear up; 4xx means the URL is wrong
            Self::Status { code, .. } => *code >= 500 || *code == 429,
            Self::Cancelled => true,
            Self::InvalidUrl(_) => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidUrl(_) => ErrorCategory::Config,
            Self::Cancelled => ErrorCategory::Other,
            _ => ErrorCategory::Network,
        }
    }
}

impl BoardErrorTrait for RowParseError {
    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Reader(_))
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Reader(_) => ErrorCategory::Parsing,
            Self::NoStrategy => ErrorCategory::Config,
        }
    }
}

impl BoardErrorTrait for MappingError {
    fn is_recoverable(&self) -> bool {
        // the sheet can be fixed between refreshes
        true
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Validation
    }
}

impl BoardErrorTrait for PipelineError {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Fetch(e) => e.is_recoverable(),
            Self::Parse(e) => e.is_recoverable(),
            Self::Mapping(e) => e.is_recoverable(),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Fetch(e) => e.category(),
            Self::Parse(e) => e.category(),
            Self::Mapping(e) => e.category(),
        }
    }
}

impl BoardErrorTrait for SchedulerError {
    fn is_recoverable(&self) -> bool {
        false
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidConfig { .. } => ErrorCategory::Config,
            Self::Stopped => ErrorCategory::Other,
        }
    }
}

/// Unified error type for the delivery_board crate
#[derive(Error, Debug)]
pub enum Error {
    /// Fetch-specific errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Row parsing errors
    #[error("Parse error: {0}")]
    Parse(#[from] RowParseError),

    /// Column validation errors
    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),

    /// Scheduler errors
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// A scheduled run failed; only its reported outcome is available
    #[error("Refresh failed: {message}")]
    Refresh {
        message: String,
        category: ErrorCategory,
        recoverable: bool,
    },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl BoardErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Fetch(e) => e.is_recoverable(),
            Self::Parse(e) => e.is_recoverable(),
            Self::Mapping(e) => e.is_recoverable(),
            Self::Scheduler(e) => e.is_recoverable(),
            Self::Refresh { recoverable, .. } => *recoverable,
            Self::Other(_) => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Fetch(e) => e.category(),
            Self::Parse(e) => e.category(),
            Self::Mapping(e) => e.category(),
            Self::Scheduler(e) => e.category(),
            Self::Refresh { category, .. } => *category,
            Self::Other(_) => ErrorCategory::Other,
        }
    }
}

impl From<PipelineError> for Error {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Fetch(e) => Self::Fetch(e),
            PipelineError::Parse(e) => Self::Parse(e),
            PipelineError::Mapping(e) => Self::Mapping(e),
        }
    }
}

impl Error {
    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other(context.into())
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
