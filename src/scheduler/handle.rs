//! Timer loop and consumer handle

use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::error::{SchedulerError, SchedulerResult};
use super::refresh::RefreshScheduler;
use super::state::{FeedSnapshot, RefreshEvent, TriggerKind};
use crate::config::RefreshConfig;
use crate::feed::FeedSource;

/// Requests forwarded from the handle to the timer loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Refresh,
    Visible,
}

/// Owner of a running refresh loop
///
/// The loop fires an initial refresh, then one per interval. Dropping the
/// handle stops the loop and cancels the in-flight fetch.
pub struct SchedulerHandle<S: FeedSource + 'static> {
    scheduler: RefreshScheduler<S>,
    commands: mpsc::Sender<Command>,
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl<S: FeedSource + 'static> RefreshScheduler<S> {
    /// Start the refresh loop with the given timing
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::InvalidConfig` for a zero interval
    pub fn start(self, config: &RefreshConfig) -> SchedulerResult<SchedulerHandle<S>> {
        if config.interval_secs == 0 {
            return Err(SchedulerError::invalid_config(
                "interval_secs",
                "must be greater than 0",
            ));
        }

        let (commands_tx, commands_rx) = mpsc::channel(16);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(run_loop(
            self.clone(),
            config.interval(),
            config.stale_after(),
            commands_rx,
            shutdown_rx,
        ));

        Ok(SchedulerHandle {
            scheduler: self,
            commands: commands_tx,
            shutdown: shutdown_tx,
            task: Some(task),
        })
    }
}

impl<S: FeedSource + 'static> SchedulerHandle<S> {
    /// Request a manual refresh
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::Stopped` once the loop has shut down
    pub async fn refresh(&self) -> SchedulerResult<()> {
        self.send(Command::Refresh).await
    }

    /// Report that the consumer became visible or regained focus
    ///
    /// Refreshes only when the data is stale.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::Stopped` once the loop has shut down
    pub async fn notify_visible(&self) -> SchedulerResult<()> {
        self.send(Command::Visible).await
    }

    async fn send(&self, command: Command) -> SchedulerResult<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SchedulerError::Stopped)
    }

    /// Current published state
    pub async fn snapshot(&self) -> FeedSnapshot {
        self.scheduler.snapshot().await
    }

    /// Subscribe to refresh events
    pub fn subscribe(&self) -> broadcast::Receiver<RefreshEvent> {
        self.scheduler.subscribe()
    }

    /// Underlying scheduler
    pub fn scheduler(&self) -> &RefreshScheduler<S> {
        &self.scheduler
    }

    /// Stop the timer, close the trigger channel and cancel the in-flight run
    pub async fn shutdown(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Refresh loop ended abnormally");
            }
        }
        self.scheduler.cancel().await;
        tracing::info!("Refresh scheduler stopped");
    }
}

impl<S: FeedSource + 'static> Drop for SchedulerHandle<S> {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.scheduler.cancel_now();
    }
}

async fn run_loop<S: FeedSource + 'static>(
    scheduler: RefreshScheduler<S>,
    interval: Duration,
    stale_after: Duration,
    mut commands: mpsc::Receiver<Command>,
    mut shutdown: watch::Receiver<bool>,
) {
    scheduler.trigger(TriggerKind::Initial).await;

    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                scheduler.trigger(TriggerKind::Periodic).await;
            }
            command = commands.recv() => match command {
                Some(Command::Refresh) => {
                    scheduler.trigger(TriggerKind::Manual).await;
                }
                Some(Command::Visible) => {
                    scheduler.notify_visible(stale_after).await;
                }
                None => break,
            },
        }
    }

    commands.close();
    tracing::debug!("Refresh loop exited");
}
