//! Time-windowed views over the record set
//!
//! Every function here is pure: it takes the sorted record set and a
//! reference day and recomputes its window from scratch. Buckets borrow the
//! records they list; nothing is cached between calls.
//!
//! - [`today_bucket`] - deliveries on the reference day
//! - [`next_active_day`] - tomorrow, or the next later day with deliveries
//! - [`yesterday_bucket`] - deliveries on the previous day
//! - [`week_window`] - rest of this week, the next busy week, or an offset week
//! - [`month_window`] - one calendar month

pub mod week;

pub use week::{week_end, week_start, week_window, within_week, WEEK_SCAN_HORIZON};

use chrono::{Duration, NaiveDate};

use crate::models::{Anchor, Bucket, Record};

/// Long day form used in subtitles, e.g. "Sunday, 18 October 2026"
pub fn subtitle_long_day(date: NaiveDate) -> String {
    date.format("%A, %d %B %Y").to_string()
}

/// Week range form used in subtitles, e.g. "12 Oct - 18 Oct 2026"
pub fn subtitle_week_range(week_of: NaiveDate) -> String {
    let start = week_start(week_of);
    let end = week_end(week_of);
    format!("{} - {}", start.format("%d %b"), end.format("%d %b %Y"))
}

fn records_on(records: &[Record], date: NaiveDate) -> Vec<&Record> {
    let mut items: Vec<&Record> = records.iter().filter(|r| r.date == date).collect();
    items.sort_by(|a, b| a.cmp_time(b));
    items
}

/// Deliveries on `today`
pub fn today_bucket(records: &[Record], today: NaiveDate) -> Bucket<'_> {
    Bucket {
        label: "Today's Deliveries".to_string(),
        subtitle: subtitle_long_day(today),
        anchor: Anchor::Day { date: today },
        items: records_on(records, today),
    }
}

/// Deliveries on the day before `today`; an empty day stays empty
pub fn yesterday_bucket(records: &[Record], today: NaiveDate) -> Bucket<'_> {
    let yesterday = today - Duration::days(1);
    Bucket {
        label: "Yesterday's Deliveries".to_string(),
        subtitle: "Completed yesterday".to_string(),
        anchor: Anchor::Day { date: yesterday },
        items: records_on(records, yesterday),
    }
}

/// Day the next-active-day view points at
///
/// Tomorrow when it has deliveries, otherwise the earliest later day that
/// has any. `None` when nothing is scheduled after `today`. The scan is
/// bounded by the size of the record set.
pub fn next_active_target(records: &[Record], today: NaiveDate) -> Option<NaiveDate> {
    let tomorrow = today + Duration::days(1);
    if records.iter().any(|r| r.date == tomorrow) {
        return Some(tomorrow);
    }

    records.iter().map(|r| r.date).filter(|d| *d > today).min()
}

/// Next-active-day view together with the day it resolved to
#[derive(Debug, Clone, PartialEq)]
pub struct NextActiveDay<'a> {
    pub target: Option<NaiveDate>,
    pub bucket: Bucket<'a>,
}

impl NextActiveDay<'_> {
    /// Whether the view shows a day other than tomorrow
    pub fn skipped_ahead(&self, today: NaiveDate) -> bool {
        matches!(self.target, Some(t) if t != today + Duration::days(1))
    }
}

/// Deliveries on the next day after `today` that has any
///
/// The label names the resolved weekday when it is not tomorrow.
pub fn next_active_day(records: &[Record], today: NaiveDate) -> NextActiveDay<'_> {
    let tomorrow = today + Duration::days(1);
    let target = next_active_target(records, today);

    let label = match target {
        Some(t) if t != tomorrow => format!("{}'s Deliveries", t.format("%A")),
        _ => "Tomorrow's Deliveries".to_string(),
    };

    let bucket = Bucket {
        label,
        subtitle: subtitle_long_day(target.unwrap_or(tomorrow)),
        anchor: target.map_or(Anchor::Unresolved, |date| Anchor::Day { date }),
        items: target.map(|t| records_on(records, t)).unwrap_or_default(),
    };

    NextActiveDay { target, bucket }
}

/// Every delivery in the calendar month `month` of `year`
///
/// Returns `None` for an invalid month.
pub fn month_window(records: &[Record], year: i32, month: u32) -> Option<Bucket<'_>> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let end = next - Duration::days(1);

    Some(Bucket {
        label: format!("Deliveries: {}", start.format("%B %Y")),
        subtitle: format!("{} - {}", start.format("%d %b"), end.format("%d %b %Y")),
        anchor: Anchor::Range { start, end },
        items: records
            .iter()
            .filter(|r| start <= r.date && r.date <= end)
            .collect(),
    })
}
