//! delivery-board - Delivery schedule feed ingester
//!
//! Fetches a published delivery sheet, turns its rows into typed records and
//! derives the day and week views a dispatch board shows.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`feed`] - Feed retrieval over HTTP with cancellation
//! - [`parser`] - Delimited row parsing with ordered fallback strategies
//! - [`mapper`] - Header aliasing, date/time normalization, record building
//! - [`models`] - Core data structures and types
//! - [`buckets`] - Today, next active day, yesterday, week and month windows
//! - [`filter`] - Customer/carrier filters, badges and postcode search
//! - [`board`] - Everything a presentation layer needs for one day
//! - [`scheduler`] - Single-flight periodic refresh
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use delivery_board::config::Config;
//! use delivery_board::feed::FeedFetcher;
//! use delivery_board::scheduler::RefreshScheduler;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let fetcher = FeedFetcher::from_config(&config.feed)?;
//!     let handle = RefreshScheduler::new(fetcher).start(&config.refresh)?;
//!     // handle.refresh().await?;
//!     handle.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod board;
pub mod buckets;
pub mod config;
pub mod error;
pub mod feed;
pub mod filter;
pub mod mapper;
pub mod models;
pub mod parser;
pub mod scheduler;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::board::Board;
    pub use crate::config::Config;
    pub use crate::error::{BoardErrorTrait, Error, ErrorCategory, Result};
    pub use crate::feed::{FeedFetcher, FeedSource};
    pub use crate::filter::{RecordFilter, Selection};
    pub use crate::mapper::RecordMapper;
    pub use crate::models::{Anchor, Bucket, DeliveryTime, Record};
    pub use crate::parser::RowParser;
    pub use crate::scheduler::{FeedSnapshot, RefreshScheduler, SchedulerHandle, TriggerKind};
}

// Direct re-exports for convenience
pub use models::{Bucket, DeliveryTime, Record};
