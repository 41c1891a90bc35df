//! Feed refresh scheduling
//!
//! Keeps the record set current by re-running the fetch → parse → map
//! pipeline on a timer and on demand.
//!
//! # Features
//!
//! - **Single flight**: at most one pipeline run is ever in progress
//! - **Preemption**: manual and periodic triggers cancel a run of another kind
//! - **Staleness checks**: visibility triggers fire only for old data
//! - **Failure tolerance**: a failed run keeps the last good record set
//! - **Event Broadcasting**: refresh progress via tokio channels
//!
//! # Modules
//!
//! - [`state`] - Status, triggers, events and snapshots
//! - [`refresh`] - The scheduler and its pipeline
//! - [`handle`] - Timer loop and the handle that owns it
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use delivery_board::config::RefreshConfig;
//! use delivery_board::feed::FeedFetcher;
//! use delivery_board::scheduler::RefreshScheduler;
//!
//! let fetcher = FeedFetcher::new("https://example.com/pub?output=csv")?;
//! let handle = RefreshScheduler::new(fetcher).start(&RefreshConfig::default())?;
//!
//! let mut events = handle.subscribe();
//! while let Ok(event) = events.recv().await {
//!     println!("{event:?}");
//! }
//! ```

pub mod error;
pub mod handle;
pub mod refresh;
pub mod state;

pub use error::{SchedulerError, SchedulerResult};
pub use handle::SchedulerHandle;
pub use refresh::RefreshScheduler;
pub use state::{FeedSnapshot, RefreshEvent, RefreshStatus, TriggerKind, TriggerOutcome};
