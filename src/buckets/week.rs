//! Monday-based week arithmetic and week windows

use chrono::{Datelike, Duration, NaiveDate};

use super::{next_active_target, subtitle_week_range};
use crate::models::{Anchor, Bucket, Record};

/// Number of weeks scanned ahead when the current week has nothing left
pub const WEEK_SCAN_HORIZON: u32 = 104;

/// Label used while showing the remainder of the current week
pub const REST_OF_WEEK_LABEL: &str = "Rest of the Week's Deliveries";

/// Monday of the week containing `date` (Sunday rolls back six days)
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Sunday of the week containing `date`
pub fn week_end(date: NaiveDate) -> NaiveDate {
    week_start(date) + Duration::days(6)
}

/// Whether `date` falls within the Monday-Sunday week containing `week_of`
pub fn within_week(date: NaiveDate, week_of: NaiveDate) -> bool {
    let start = week_start(week_of);
    start <= date && date <= start + Duration::days(6)
}

fn week_anchor(start: NaiveDate) -> Anchor {
    Anchor::Range {
        start,
        end: start + Duration::days(6),
    }
}

fn commencing_label(start: NaiveDate) -> String {
    format!("Deliveries Week Commencing {}", start.format("%d %b %Y"))
}

/// Records of the week at `offset` weeks from the week containing `today`
///
/// A non-zero offset returns that full calendar week, past or future. Offset
/// zero prefers what is left of this week from tomorrow on, leaving out the
/// next active day (shown on its own). When nothing is left it moves ahead
/// to the first later week holding any record, searching at most
/// [`WEEK_SCAN_HORIZON`] weeks, and otherwise returns an empty window on the
/// current week. The next active day is left out of that later week too, so
/// a week holding only that day comes back empty.
pub fn week_window(records: &[Record], today: NaiveDate, offset: i32) -> Bucket<'_> {
    let current = week_start(today);

    if offset != 0 {
        let start = current + Duration::weeks(i64::from(offset));
        return Bucket {
            label: commencing_label(start),
            subtitle: subtitle_week_range(start),
            anchor: week_anchor(start),
            items: records
                .iter()
                .filter(|r| within_week(r.date, start))
                .collect(),
        };
    }

    let tomorrow = today + Duration::days(1);
    let target = next_active_target(records, today);
    let not_target = |r: &&Record| Some(r.date) != target;

    let remaining: Vec<&Record> = records
        .iter()
        .filter(|r| r.date >= tomorrow && within_week(r.date, current))
        .filter(not_target)
        .collect();

    if !remaining.is_empty() {
        return Bucket {
            label: REST_OF_WEEK_LABEL.to_string(),
            subtitle: subtitle_week_range(current),
            anchor: week_anchor(current),
            items: remaining,
        };
    }

    // the scan looks at every record; the next active day is only dropped
    // from the chosen week, which may leave it empty
    let next_week = (1..=WEEK_SCAN_HORIZON)
        .map(|i| current + Duration::weeks(i64::from(i)))
        .find(|start| records.iter().any(|r| within_week(r.date, *start)));

    if let Some(start) = next_week {
        tracing::trace!(week = %start, "Resolved next week with deliveries");
        return Bucket {
            label: commencing_label(start),
            subtitle: subtitle_week_range(start),
            anchor: week_anchor(start),
            items: records
                .iter()
                .filter(|r| within_week(r.date, start))
                .filter(not_target)
                .collect(),
        };
    }

    Bucket {
        label: REST_OF_WEEK_LABEL.to_string(),
        subtitle: subtitle_week_range(current),
        anchor: week_anchor(current),
        items: Vec::new(),
    }
}
