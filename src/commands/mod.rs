pub mod search;
pub mod show;
pub mod watch;

// Re-export command functions for convenience
pub use search::search;
pub use show::{show, ShowParams};
pub use watch::watch;

use tokio::sync::broadcast::{self, error::RecvError};

use delivery_board::config::Config;
use delivery_board::error::{Error, Result};
use delivery_board::feed::FeedFetcher;
use delivery_board::models::{Bucket, Record};
use delivery_board::parser::RowParser;
use delivery_board::scheduler::{
    FeedSnapshot, RefreshEvent, RefreshScheduler, SchedulerError, TriggerKind, TriggerOutcome,
};
use delivery_board::utils::truncate_text;

/// Run the pipeline once and return the resulting snapshot
pub async fn fetch_snapshot(config: &Config) -> Result<FeedSnapshot> {
    let fetcher = FeedFetcher::from_config(&config.feed)?;
    let parser = RowParser::from_choice(config.parser.strategy);
    let scheduler = RefreshScheduler::with_parser(fetcher, parser);

    let mut events = scheduler.subscribe();
    let generation = match scheduler.trigger(TriggerKind::Manual).await {
        TriggerOutcome::Started(generation) => generation,
        TriggerOutcome::Ignored => return Err(Error::other("Refresh was not started")),
    };

    wait_for_run(&mut events, generation).await?;
    Ok(scheduler.snapshot().await)
}

/// Wait until run `generation` reports an outcome
async fn wait_for_run(
    events: &mut broadcast::Receiver<RefreshEvent>,
    generation: u64,
) -> Result<()> {
    loop {
        match events.recv().await {
            Ok(RefreshEvent::Succeeded { generation: g, .. }) if g == generation => return Ok(()),
            Ok(RefreshEvent::Failed {
                generation: g,
                message,
                category,
                recoverable,
                ..
            }) if g == generation => {
                return Err(Error::Refresh {
                    message,
                    category,
                    recoverable,
                })
            }
            Ok(RefreshEvent::Cancelled { generation: g, .. }) if g == generation => {
                return Err(Error::other("Refresh was cancelled"))
            }
            Ok(_) | Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => return Err(SchedulerError::Stopped.into()),
        }
    }
}

/// Print one bucket as a text table
pub fn print_bucket(bucket: &Bucket<'_>) {
    println!("\n{} ({})", bucket.label, bucket.subtitle);
    println!("{}", "=".repeat(72));

    if bucket.is_empty() {
        println!("  No deliveries");
        return;
    }

    for record in &bucket.items {
        print_record(record);
    }
    println!("  {} deliver{}", bucket.len(), if bucket.len() == 1 { "y" } else { "ies" });
}

/// Print one record as a single line plus optional notes
pub fn print_record(record: &Record) {
    use delivery_board::filter::{carrier_label, CustomerGroup};

    let time = if record.time_minutes.is_known() {
        record.time_minutes.to_string()
    } else if record.time.is_empty() {
        "--:--".to_string()
    } else {
        truncate_text(&record.time, 5)
    };

    println!(
        "  {} {:<5} {:<6} {:<24} {:<30} {}",
        record.date.format("%d/%m"),
        time,
        CustomerGroup::classify(&record.customer).as_str(),
        truncate_text(&record.customer, 24),
        truncate_text(&record.full_address(), 30),
        carrier_label(&record.delivery_type),
    );
    if !record.notes.is_empty() {
        println!("        > {}", truncate_text(&record.notes, 64));
    }
}
