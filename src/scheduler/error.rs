//! Error types for the scheduler module

use std::fmt;

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Scheduler-specific errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// The refresh loop has stopped and no longer accepts triggers
    Stopped,

    /// Refresh configuration error
    InvalidConfig { field: String, reason: String },
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "Refresh scheduler has stopped"),
            Self::InvalidConfig { field, reason } => {
                write!(f, "Refresh config error in '{}': {}", field, reason)
            }
        }
    }
}

impl std::error::Error for SchedulerError {}

impl SchedulerError {
    /// Create an invalid config error
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            SchedulerError::Stopped.to_string(),
            "Refresh scheduler has stopped"
        );
        assert_eq!(
            SchedulerError::invalid_config("interval", "must be non-zero").to_string(),
            "Refresh config error in 'interval': must be non-zero"
        );
    }
}
