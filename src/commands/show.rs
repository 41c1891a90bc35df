use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};

use delivery_board::board::{self, Board};
use delivery_board::config::Config;
use delivery_board::filter::{RecordFilter, Selection};

use super::{fetch_snapshot, print_bucket};

/// Options for the `show` command
#[derive(Debug, Clone, Default)]
pub struct ShowParams {
    /// Reference day; today when absent
    pub date: Option<NaiveDate>,
    pub week_offset: i32,
    pub customer: Option<String>,
    pub carrier: Option<String>,
    /// Print one calendar month ("YYYY-MM") instead of the board
    pub month: Option<String>,
    pub json: bool,
}

pub async fn show(config: &Config, params: ShowParams) -> Result<()> {
    let snapshot = fetch_snapshot(config).await?;

    let today = params.date.unwrap_or_else(|| Local::now().date_naive());
    let filter = RecordFilter::new(
        Selection::from_option(params.customer.as_deref()),
        Selection::from_option(params.carrier.as_deref()),
    );

    if let Some(month) = params.month.as_deref() {
        let (year, month) = parse_month(month)?;
        let bucket = board::month(&snapshot.records, year, month, &filter)
            .with_context(|| format!("Invalid month: {year}-{month:02}"))?;

        if params.json {
            println!("{}", serde_json::to_string_pretty(&bucket)?);
        } else {
            print_bucket(&bucket);
        }
        return Ok(());
    }

    let board = Board::build(&snapshot, today, params.week_offset, &filter);

    if params.json {
        println!("{}", serde_json::to_string_pretty(&board)?);
        return Ok(());
    }

    println!("Delivery board for {}", today.format("%A, %d %B %Y"));
    if let Some(updated) = board.last_updated {
        println!(
            "Last updated: {}",
            updated.with_timezone(&Local).format("%H:%M:%S")
        );
    }
    if !filter.is_pass_through() {
        println!("Filter: customer={} carrier={}", filter.customer, filter.carrier);
    }

    for bucket in board.buckets() {
        print_bucket(bucket);
    }

    println!("\n{} deliveries in feed", board.total_records);
    Ok(())
}

/// Parse "YYYY-MM"
fn parse_month(text: &str) -> Result<(i32, u32)> {
    let (year, month) = text
        .split_once('-')
        .with_context(|| format!("Expected YYYY-MM, got '{text}'"))?;
    let year = year.parse::<i32>().context("Invalid year")?;
    let month = month.parse::<u32>().context("Invalid month")?;
    Ok((year, month))
}
