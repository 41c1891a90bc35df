//! Delimited text parsing
//!
//! This module turns raw feed text into rows of cells. Parsing runs an
//! ordered list of strategies and the first one that succeeds wins:
//!
//! - [`ParseStrategy::Delimited`] - the `csv` crate reader
//! - [`ParseStrategy::Fallback`] - a hand-written two-state machine
//!
//! Both strategies produce identical rows for well-formed input, so falling
//! back never changes what the mapper sees.

pub mod delimited;
pub mod fallback;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::error::RowParseError;

/// Rows of cells; the first row is the header
pub type Rows = Vec<Vec<String>>;

/// A single row parsing strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseStrategy {
    /// Standards-compliant reader (`csv` crate)
    Delimited,
    /// Character-by-character state machine
    Fallback,
}

impl ParseStrategy {
    /// Run this strategy over `text`
    pub fn parse(&self, text: &str) -> Result<Rows, RowParseError> {
        match self {
            Self::Delimited => delimited::parse(text),
            Self::Fallback => Ok(fallback::parse(text)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delimited => "delimited",
            Self::Fallback => "fallback",
        }
    }
}

impl fmt::Display for ParseStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strategy selection as written in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyChoice {
    /// Delimited reader first, then the fallback
    #[default]
    Auto,
    /// Delimited reader only
    Delimited,
    /// Fallback only
    Fallback,
}

impl StrategyChoice {
    /// Ordered strategies for this choice
    pub fn strategies(&self) -> Vec<ParseStrategy> {
        match self {
            Self::Auto => vec![ParseStrategy::Delimited, ParseStrategy::Fallback],
            Self::Delimited => vec![ParseStrategy::Delimited],
            Self::Fallback => vec![ParseStrategy::Fallback],
        }
    }
}

impl FromStr for StrategyChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "delimited" | "csv" => Ok(Self::Delimited),
            "fallback" => Ok(Self::Fallback),
            other => Err(format!(
                "Unknown parser strategy '{other}'. Valid options: auto, delimited, fallback"
            )),
        }
    }
}

/// Row parser trying its strategies in order
#[derive(Debug, Clone)]
pub struct RowParser {
    strategies: Vec<ParseStrategy>,
}

impl Default for RowParser {
    fn default() -> Self {
        Self::from_choice(StrategyChoice::Auto)
    }
}

impl RowParser {
    /// Create a parser with an explicit strategy order
    pub fn new(strategies: Vec<ParseStrategy>) -> Self {
        Self { strategies }
    }

    /// Create a parser from a configuration choice
    pub fn from_choice(choice: StrategyChoice) -> Self {
        Self::new(choice.strategies())
    }

    pub fn strategies(&self) -> &[ParseStrategy] {
        &self.strategies
    }

    /// Parse text into rows using the first strategy that succeeds
    ///
    /// # Errors
    ///
    /// Returns the last strategy's error when every strategy fails, or
    /// `RowParseError::NoStrategy` when none is configured.
    pub fn parse(&self, text: &str) -> Result<Rows, RowParseError> {
        let mut last_error = None;

        for strategy in &self.strategies {
            match strategy.parse(text) {
                Ok(rows) => {
                    tracing::trace!(strategy = %strategy, rows = rows.len(), "Parsed feed rows");
                    return Ok(rows);
                }
                Err(e) => {
                    tracing::warn!(strategy = %strategy, error = %e, "Row parsing strategy failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(RowParseError::NoStrategy))
    }
}
