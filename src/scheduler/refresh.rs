//! Single-flight refresh scheduler
//!
//! Runs the fetch → parse → map pipeline and publishes the result:
//! - At most one run is in flight; later triggers are ignored or preempt it
//! - A preempted run never touches the published state
//! - Failures keep the previous record set and surface a message
//! - Every transition is broadcast as a [`RefreshEvent`]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, RwLock};
use tokio_util::sync::CancellationToken;

use super::state::{FeedSnapshot, RefreshEvent, RefreshStatus, TriggerKind, TriggerOutcome};
use crate::error::BoardErrorTrait;
use crate::feed::FeedSource;
use crate::mapper::{MappingOutcome, RecordMapper};
use crate::parser::RowParser;
use crate::utils::error::PipelineError;

/// Capacity of the event channel; slow subscribers see `Lagged`
const EVENT_CAPACITY: usize = 64;

/// The run currently allowed to publish
#[derive(Debug)]
struct InFlight {
    generation: u64,
    trigger: TriggerKind,
    token: CancellationToken,
    /// Status to restore when the run is cancelled without a successor
    prior: RefreshStatus,
}

struct Inner<S> {
    source: S,
    parser: RowParser,
    mapper: RecordMapper,
    state: RwLock<FeedSnapshot>,
    in_flight: Mutex<Option<InFlight>>,
    next_generation: AtomicU64,
    events: broadcast::Sender<RefreshEvent>,
}

/// Refresh scheduler over a [`FeedSource`]
///
/// Cloning is cheap; clones share the same state.
pub struct RefreshScheduler<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for RefreshScheduler<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: FeedSource + 'static> RefreshScheduler<S> {
    /// Create a scheduler with the default parser chain
    pub fn new(source: S) -> Self {
        Self::with_parser(source, RowParser::default())
    }

    /// Create a scheduler with a custom parser chain
    pub fn with_parser(source: S, parser: RowParser) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            inner: Arc::new(Inner {
                source,
                parser,
                mapper: RecordMapper::new(),
                state: RwLock::new(FeedSnapshot::default()),
                in_flight: Mutex::new(None),
                next_generation: AtomicU64::new(1),
                events,
            }),
        }
    }

    /// Subscribe to refresh events
    pub fn subscribe(&self) -> broadcast::Receiver<RefreshEvent> {
        self.inner.events.subscribe()
    }

    /// Current published state
    pub async fn snapshot(&self) -> FeedSnapshot {
        self.inner.state.read().await.clone()
    }

    /// Whether a run is in flight
    pub fn is_fetching(&self) -> bool {
        self.inner
            .lock_in_flight()
            .as_ref()
            .is_some_and(|running| !running.token.is_cancelled())
    }

    /// Ask for a refresh
    ///
    /// Starts a run unless one is in flight that `kind` does not preempt.
    /// The run continues in a spawned task; watch [`Self::subscribe`] for
    /// its outcome.
    pub async fn trigger(&self, kind: TriggerKind) -> TriggerOutcome {
        // state lock first so a finishing run cannot commit between the
        // in-flight decision and the Fetching transition
        let mut state = self.inner.state.write().await;

        let (generation, token) = {
            let mut in_flight = self.inner.lock_in_flight();

            let prior = match in_flight.as_ref() {
                // a run cancelled from Drop still holds the slot until it commits
                Some(running)
                    if !running.token.is_cancelled() && !kind.preempts(running.trigger) =>
                {
                    tracing::debug!(
                        trigger = %kind,
                        in_flight = %running.trigger,
                        "Refresh already in flight; ignoring trigger"
                    );
                    self.inner.emit(RefreshEvent::Ignored {
                        trigger: kind,
                        in_flight: running.trigger,
                    });
                    return TriggerOutcome::Ignored;
                }
                Some(running) => {
                    tracing::info!(
                        trigger = %kind,
                        preempted = %running.trigger,
                        generation = running.generation,
                        "Preempting in-flight refresh"
                    );
                    running.token.cancel();
                    self.inner.emit(RefreshEvent::Cancelled {
                        generation: running.generation,
                        trigger: running.trigger,
                    });
                    running.prior
                }
                None => state.status,
            };

            let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
            let token = CancellationToken::new();
            *in_flight = Some(InFlight {
                generation,
                trigger: kind,
                token: token.clone(),
                prior,
            });
            (generation, token)
        };

        state.status = RefreshStatus::Fetching;
        state.loading = true;
        drop(state);

        tracing::info!(trigger = %kind, generation, source = %self.inner.source.describe(), "Refresh started");
        self.inner.emit(RefreshEvent::Started {
            generation,
            trigger: kind,
        });

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let result = inner.run_pipeline(&token).await;
            inner.commit(generation, kind, &token, result).await;
        });

        TriggerOutcome::Started(generation)
    }

    /// Refresh when nothing has loaded yet or the data is older than `stale_after`
    pub async fn notify_visible(&self, stale_after: Duration) -> TriggerOutcome {
        let stale = self.inner.state.read().await.is_stale(Utc::now(), stale_after);
        if !stale {
            tracing::debug!("Data is fresh; skipping visibility refresh");
            return TriggerOutcome::Ignored;
        }
        self.trigger(TriggerKind::Visibility).await
    }

    /// Cancel the in-flight run without starting another
    ///
    /// The published record set is left untouched.
    pub async fn cancel(&self) {
        let mut state = self.inner.state.write().await;
        if let Some(prior) = self.inner.cancel_in_flight() {
            state.status = prior;
            state.loading = false;
        }
    }

    /// Cancel the in-flight run from a synchronous context
    ///
    /// Only the token is cancelled here. The run keeps its slot until its
    /// own commit restores the prior status and announces the cancellation.
    pub(crate) fn cancel_now(&self) {
        if let Some(running) = self.inner.lock_in_flight().as_ref() {
            tracing::debug!(generation = running.generation, "Cancelling in-flight refresh");
            running.token.cancel();
        }
    }
}

impl<S: FeedSource> Inner<S> {
    fn lock_in_flight(&self) -> MutexGuard<'_, Option<InFlight>> {
        self.in_flight.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, event: RefreshEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }

    /// Take and cancel the in-flight run, returning its prior status
    fn cancel_in_flight(&self) -> Option<RefreshStatus> {
        let running = self.lock_in_flight().take()?;
        running.token.cancel();
        tracing::debug!(generation = running.generation, "Cancelled in-flight refresh");
        self.emit(RefreshEvent::Cancelled {
            generation: running.generation,
            trigger: running.trigger,
        });
        Some(running.prior)
    }

    async fn run_pipeline(&self, token: &CancellationToken) -> Result<MappingOutcome, PipelineError> {
        let text = self.source.fetch(token).await?;
        let rows = self.parser.parse(&text)?;
        let outcome = self.mapper.map(&rows)?;
        Ok(outcome)
    }

    /// Publish the result of run `generation` if it is still current
    ///
    /// A run that lost its slot is discarded silently: whoever took the slot
    /// owns the state and has announced the cancellation. A run that still
    /// holds its slot but was cancelled restores the status it replaced.
    async fn commit(
        &self,
        generation: u64,
        trigger: TriggerKind,
        token: &CancellationToken,
        result: Result<MappingOutcome, PipelineError>,
    ) {
        let mut state = self.state.write().await;

        let prior = {
            let mut in_flight = self.lock_in_flight();
            let current = in_flight
                .as_ref()
                .is_some_and(|running| running.generation == generation);

            if !current {
                tracing::debug!(generation, "Discarding result of superseded refresh");
                return;
            }

            in_flight.take().map(|running| running.prior)
        };

        state.loading = false;

        let cancelled = token.is_cancelled() || result.as_ref().is_err_and(|e| e.is_cancelled());
        if cancelled {
            state.status = prior.unwrap_or_default();
            drop(state);

            tracing::debug!(generation, "Refresh cancelled before commit");
            self.emit(RefreshEvent::Cancelled { generation, trigger });
            return;
        }

        match result {
            Ok(outcome) => {
                let records = outcome.records.len();
                let skipped = outcome.stats.skipped();

                state.records = Arc::from(outcome.records);
                state.status = RefreshStatus::Succeeded;
                state.error = None;
                state.last_updated = Some(Utc::now());
                drop(state);

                tracing::info!(generation, records, skipped, "Refresh succeeded");
                self.emit(RefreshEvent::Succeeded {
                    generation,
                    trigger,
                    records,
                    skipped,
                });
            }
            Err(err) => {
                let message = err.to_string();
                let category = err.category();
                let recoverable = err.is_recoverable();

                state.status = RefreshStatus::Failed;
                state.error = Some(message.clone());
                drop(state);

                tracing::warn!(
                    generation,
                    error = %message,
                    category = category.as_str(),
                    recoverable,
                    "Refresh failed; keeping previous records"
                );
                self.emit(RefreshEvent::Failed {
                    generation,
                    trigger,
                    message,
                    category,
                    recoverable,
                });
            }
        }
    }
}
