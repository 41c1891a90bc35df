//! Refresh state, triggers and events

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ErrorCategory;
use crate::models::Record;

// ============================================================================
// Status & Triggers
// ============================================================================

/// Refresh state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshStatus {
    #[default]
    Idle,
    Fetching,
    Succeeded,
    Failed,
}

impl fmt::Display for RefreshStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What asked for a refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerKind {
    /// First load when the scheduler starts
    Initial,
    /// Fixed-interval timer
    Periodic,
    /// Explicit user request
    Manual,
    /// Consumer became visible again with stale data
    Visibility,
}

impl TriggerKind {
    /// Whether a trigger of this kind may cancel the run started by `running`
    ///
    /// Manual wins over everything, including an older manual run. Periodic
    /// only replaces runs of another kind. Initial and visibility triggers
    /// never preempt.
    pub fn preempts(self, running: TriggerKind) -> bool {
        match self {
            Self::Manual => true,
            Self::Periodic => running != Self::Periodic,
            Self::Initial | Self::Visibility => false,
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initial => "initial",
            Self::Periodic => "periodic",
            Self::Manual => "manual",
            Self::Visibility => "visibility",
        };
        f.write_str(name)
    }
}

/// Result of asking the scheduler to refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A new run was started with this generation
    Started(u64),
    /// The trigger was dropped because another run is in flight
    Ignored,
}

impl TriggerOutcome {
    pub fn started(&self) -> bool {
        matches!(self, Self::Started(_))
    }
}

// ============================================================================
// Events
// ============================================================================

/// Events emitted by the refresh scheduler
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshEvent {
    /// A pipeline run began
    Started { generation: u64, trigger: TriggerKind },

    /// A run replaced the record set
    Succeeded {
        generation: u64,
        trigger: TriggerKind,
        records: usize,
        skipped: usize,
    },

    /// A run failed; the previous record set is kept
    Failed {
        generation: u64,
        trigger: TriggerKind,
        message: String,
        category: ErrorCategory,
        /// Whether a later refresh may succeed without outside changes
        recoverable: bool,
    },

    /// A run was superseded or shut down before it could commit
    Cancelled { generation: u64, trigger: TriggerKind },

    /// A trigger arrived while another run was in flight
    Ignored {
        trigger: TriggerKind,
        in_flight: TriggerKind,
    },
}

impl RefreshEvent {
    /// Whether this event ends a run
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Succeeded { .. } | Self::Failed { .. } | Self::Cancelled { .. }
        )
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// Immutable view of the scheduler state handed to readers
///
/// `records` is shared; a successful refresh swaps in a new set instead of
/// mutating this one.
#[derive(Debug, Clone)]
pub struct FeedSnapshot {
    pub records: Arc<[Record]>,
    pub status: RefreshStatus,
    pub loading: bool,
    pub error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Default for FeedSnapshot {
    fn default() -> Self {
        Self {
            records: Arc::from(Vec::new()),
            status: RefreshStatus::Idle,
            loading: false,
            error: None,
            last_updated: None,
        }
    }
}

impl FeedSnapshot {
    /// Whether a visibility refresh is due at `now`
    ///
    /// True when nothing has loaded yet or the last success is older than
    /// `stale_after`.
    pub fn is_stale(&self, now: DateTime<Utc>, stale_after: Duration) -> bool {
        match self.last_updated {
            None => true,
            Some(at) => {
                let age = now.signed_duration_since(at);
                age.to_std().map(|age| age > stale_after).unwrap_or(false)
            }
        }
    }
}
