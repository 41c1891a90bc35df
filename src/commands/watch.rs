use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

use delivery_board::config::Config;
use delivery_board::feed::FeedFetcher;
use delivery_board::parser::RowParser;
use delivery_board::scheduler::{RefreshEvent, RefreshScheduler};

/// Console commands accepted while watching, one per line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WatchCommand {
    /// Manual refresh
    Refresh,
    /// Treat the console as refocused; refreshes only stale data
    Visible,
    /// Log the current state
    Status,
    Quit,
}

impl WatchCommand {
    fn parse(line: &str) -> Option<Self> {
        match line.trim().to_lowercase().as_str() {
            "r" | "refresh" => Some(Self::Refresh),
            "v" | "visible" => Some(Self::Visible),
            "s" | "status" => Some(Self::Status),
            "q" | "quit" | "exit" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Keep the feed fresh until Ctrl-C, logging every refresh
///
/// Lines on stdin drive the scheduler: `r` refreshes now, `v` refreshes if
/// the data is stale, `s` logs the current state and `q` stops.
pub async fn watch(config: &Config) -> Result<()> {
    let fetcher = FeedFetcher::from_config(&config.feed).context("Failed to create feed fetcher")?;
    let parser = RowParser::from_choice(config.parser.strategy);

    let handle = RefreshScheduler::with_parser(fetcher, parser)
        .start(&config.refresh)
        .context("Failed to start refresh scheduler")?;
    let mut events = handle.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    tracing::info!(
        interval_secs = config.refresh.interval_secs,
        stale_after_secs = config.refresh.stale_after_secs,
        url = %config.feed.url,
        "Watching feed (r = refresh, v = visible, s = status, q or Ctrl-C to stop)"
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                break;
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match WatchCommand::parse(&line) {
                    Some(WatchCommand::Refresh) => handle.refresh().await?,
                    Some(WatchCommand::Visible) => handle.notify_visible().await?,
                    Some(WatchCommand::Status) => {
                        let snapshot = handle.snapshot().await;
                        tracing::info!(
                            status = %snapshot.status,
                            loading = snapshot.loading,
                            records = snapshot.records.len(),
                            last_updated = ?snapshot.last_updated,
                            error = ?snapshot.error,
                            "Current feed state"
                        );
                    }
                    Some(WatchCommand::Quit) => break,
                    None if line.trim().is_empty() => {}
                    None => tracing::warn!(input = %line.trim(), "Unknown command"),
                },
                Ok(None) => stdin_open = false,
                Err(e) => {
                    tracing::warn!(error = %e, "Stopped reading console commands");
                    stdin_open = false;
                }
            },
            event = events.recv() => match event {
                Ok(RefreshEvent::Succeeded { records, skipped, trigger, .. }) => {
                    tracing::info!(%trigger, records, skipped, "Feed refreshed");
                }
                Ok(RefreshEvent::Failed { message, trigger, category, recoverable, .. }) => {
                    tracing::error!(
                        %trigger,
                        error = %message,
                        category = category.as_str(),
                        recoverable,
                        "Feed refresh failed"
                    );
                }
                Ok(RefreshEvent::Ignored { trigger, in_flight }) => {
                    tracing::info!(%trigger, %in_flight, "Refresh already running");
                }
                Ok(event) => tracing::debug!(?event, "Refresh event"),
                Err(RecvError::Lagged(n)) => tracing::warn!(skipped = n, "Missed refresh events"),
                Err(RecvError::Closed) => break,
            }
        }
    }

    handle.shutdown().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_watch_commands() {
        assert_eq!(WatchCommand::parse("r"), Some(WatchCommand::Refresh));
        assert_eq!(WatchCommand::parse(" Refresh \n"), Some(WatchCommand::Refresh));
        assert_eq!(WatchCommand::parse("v"), Some(WatchCommand::Visible));
        assert_eq!(WatchCommand::parse("status"), Some(WatchCommand::Status));
        assert_eq!(WatchCommand::parse("Q"), Some(WatchCommand::Quit));
        assert_eq!(WatchCommand::parse(""), None);
        assert_eq!(WatchCommand::parse("reload"), None);
    }
}
