//! Common test utilities

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::{broadcast, oneshot};
use tokio_util::sync::CancellationToken;

use delivery_board::feed::FeedSource;
use delivery_board::models::{DeliveryTime, Record};
use delivery_board::scheduler::RefreshEvent;
use delivery_board::utils::error::FetchError;

/// Header row used by the sample feeds
#[allow(dead_code)]
pub const HEADER: &str = "Date,Customer,Delivery Address,Time,Postcode,Delivery Type,Notes";

/// Small well-formed feed
#[allow(dead_code)]
pub fn sample_feed() -> String {
    [
        HEADER,
        "14/10/2026,KWL Ltd,\"Unit 4, Mill Lane\",09:30,LS1 4AB,RD Transport,",
        "14/10/2026,Acme,2 Station Rd,9:30AM,LS2 7CD,AWS,Side door",
        "15/10/2026,JC Kitchens,3 High St,14:00,BD1 1EF,Collection,\"Call \"\"Dave\"\" first\"",
        ",,,,,,",
        "not a date,Nobody,Nowhere,10:00,,,",
    ]
    .join("\n")
}

/// Create a record with default optional fields
#[allow(dead_code)]
pub fn record(date: NaiveDate, customer: &str, minutes: u16) -> Record {
    let hh = minutes / 60;
    let mm = minutes % 60;
    Record::new(
        date,
        customer,
        "1 High St",
        format!("{hh:02}:{mm:02}"),
        DeliveryTime::At(minutes),
    )
}

/// Date in 2026
#[allow(dead_code)]
pub fn ymd(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, month, day).unwrap()
}

/// One scripted answer of a [`ScriptedSource`]
#[allow(dead_code)]
pub enum Step {
    /// Answer immediately with this text
    Text(String),
    /// Fail immediately
    Fail(FetchError),
    /// Wait for the test to release the answer, or for cancellation
    Gated(oneshot::Receiver<Result<String, FetchError>>),
}

/// Feed source replaying a script of answers
#[allow(dead_code)]
#[derive(Default)]
pub struct ScriptedSource {
    steps: Mutex<VecDeque<Step>>,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl ScriptedSource {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Gated step plus the sender that releases its answer
    pub fn gated() -> (Step, oneshot::Sender<Result<String, FetchError>>) {
        let (tx, rx) = oneshot::channel();
        (Step::Gated(rx), tx)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedSource for ScriptedSource {
    async fn fetch(&self, cancel: &CancellationToken) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self.steps.lock().unwrap().pop_front();

        match step {
            Some(Step::Text(text)) => Ok(text),
            Some(Step::Fail(err)) => Err(err),
            Some(Step::Gated(rx)) => {
                tokio::select! {
                    _ = cancel.cancelled() => Err(FetchError::Cancelled),
                    answer = rx => answer.unwrap_or(Err(FetchError::Cancelled)),
                }
            }
            None => Err(FetchError::InvalidUrl("script exhausted".into())),
        }
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}

/// Wait for the next event matching `pred`, failing after five seconds
#[allow(dead_code)]
pub async fn next_event<F>(events: &mut broadcast::Receiver<RefreshEvent>, pred: F) -> RefreshEvent
where
    F: Fn(&RefreshEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let event = events.recv().await.expect("event channel closed");
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for refresh event")
}
