//! Board assembly
//!
//! A [`Board`] is everything a presentation layer renders for one reference
//! day: the four buckets with the active filter applied, plus the refresh
//! state of the snapshot they came from. Buckets are resolved against the
//! full record set and filtered afterwards, so a filter never moves the
//! next-active-day target or the week that is shown.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::buckets::{month_window, next_active_day, today_bucket, week_window, yesterday_bucket};
use crate::filter::{carrier_options, customer_options, search_postcodes, PostcodeGroup, RecordFilter};
use crate::models::{Bucket, Record};
use crate::scheduler::{FeedSnapshot, RefreshStatus};

/// Derived view of one snapshot
#[derive(Debug, Clone, Serialize)]
pub struct Board<'a> {
    pub reference_day: NaiveDate,
    pub week_offset: i32,
    pub today: Bucket<'a>,
    pub next_active: Bucket<'a>,
    /// Day the next-active bucket resolved to
    pub next_active_date: Option<NaiveDate>,
    pub yesterday: Bucket<'a>,
    pub week: Bucket<'a>,
    pub status: RefreshStatus,
    pub loading: bool,
    pub error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    /// Size of the unfiltered record set
    pub total_records: usize,
    pub customers: Vec<String>,
    pub carriers: Vec<String>,
}

impl<'a> Board<'a> {
    /// Build the board for `today` from a snapshot
    pub fn build(
        snapshot: &'a FeedSnapshot,
        today: NaiveDate,
        week_offset: i32,
        filter: &RecordFilter,
    ) -> Self {
        let mut board = Self::from_records(&snapshot.records, today, week_offset, filter);
        board.status = snapshot.status;
        board.loading = snapshot.loading;
        board.error = snapshot.error.clone();
        board.last_updated = snapshot.last_updated;
        board
    }

    /// Build the board from a bare record set
    ///
    /// `records` must already be in schedule order.
    pub fn from_records(
        records: &'a [Record],
        today: NaiveDate,
        week_offset: i32,
        filter: &RecordFilter,
    ) -> Self {
        let next = next_active_day(records, today);

        Self {
            reference_day: today,
            week_offset,
            today: filter.apply(&today_bucket(records, today)),
            next_active: filter.apply(&next.bucket),
            next_active_date: next.target,
            yesterday: filter.apply(&yesterday_bucket(records, today)),
            week: filter.apply(&week_window(records, today, week_offset)),
            status: RefreshStatus::Idle,
            loading: false,
            error: None,
            last_updated: None,
            total_records: records.len(),
            customers: customer_options(records),
            carriers: carrier_options(records),
        }
    }

    /// Buckets in display order
    pub fn buckets(&self) -> [&Bucket<'a>; 4] {
        [&self.today, &self.next_active, &self.yesterday, &self.week]
    }

    /// Whether every bucket is empty after filtering
    pub fn is_empty(&self) -> bool {
        self.buckets().iter().all(|b| b.is_empty())
    }
}

/// Filtered month view for printing
pub fn month<'a>(
    records: &'a [Record],
    year: i32,
    month: u32,
    filter: &RecordFilter,
) -> Option<Bucket<'a>> {
    month_window(records, year, month).map(|bucket| filter.apply(&bucket))
}

/// Postcode search over the whole record set
///
/// Filters do not apply; queries shorter than two characters yield nothing.
pub fn search<'a>(records: &'a [Record], query: &str) -> Vec<PostcodeGroup<'a>> {
    search_postcodes(records, query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Selection;
    use crate::models::{sort_schedule, DeliveryTime};
    use std::sync::Arc;

    fn ymd(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, d).unwrap()
    }

    fn rec(date: NaiveDate, customer: &str, carrier: &str) -> Record {
        let mut record = Record::new(date, customer, "1 High St", "09:00", DeliveryTime::At(540));
        record.delivery_type = carrier.to_string();
        record
    }

    fn records() -> Vec<Record> {
        let mut records = vec![
            rec(ymd(10, 13), "JC Kitchens", "RD Transport"),
            rec(ymd(10, 14), "KWL Ltd", "AWS"),
            rec(ymd(10, 14), "Acme", "Collection"),
            rec(ymd(10, 16), "JC Kitchens", "AWS"),
            rec(ymd(10, 21), "Acme", "RD Transport"),
        ];
        sort_schedule(&mut records);
        records
    }

    #[test]
    fn test_board_buckets() {
        let records = records();
        let board = Board::from_records(&records, ymd(10, 14), 0, &RecordFilter::all());

        assert_eq!(board.today.len(), 2);
        assert_eq!(board.yesterday.len(), 1);
        assert_eq!(board.next_active_date, Some(ymd(10, 16)));
        assert_eq!(board.next_active.label, "Friday's Deliveries");
        // nothing else left this week, so the week view moves ahead
        assert_eq!(board.week.label, "Deliveries Week Commencing 19 Oct 2026");
        assert_eq!(board.week.len(), 1);
        assert_eq!(board.total_records, 5);
    }

    #[test]
    fn test_filter_does_not_move_targets() {
        let records = records();
        let filter = RecordFilter::new(Selection::Only("Acme".into()), Selection::All);
        let board = Board::from_records(&records, ymd(10, 14), 0, &filter);

        assert_eq!(board.next_active_date, Some(ymd(10, 16)));
        assert!(board.next_active.is_empty());
        assert_eq!(board.today.len(), 1);
        assert_eq!(board.today.items[0].customer, "Acme");
        // options always come from the full set
        assert_eq!(board.customers.len(), 3);
    }

    #[test]
    fn test_build_copies_refresh_state() {
        let snapshot = FeedSnapshot {
            records: Arc::from(records()),
            status: RefreshStatus::Failed,
            loading: false,
            error: Some("Network error: 503 Service Unavailable".into()),
            last_updated: None,
        };
        let board = Board::build(&snapshot, ymd(10, 14), 0, &RecordFilter::all());
        assert_eq!(board.status, RefreshStatus::Failed);
        assert!(board.error.is_some());
        assert!(!board.is_empty());
    }

    #[test]
    fn test_empty_board() {
        let board = Board::from_records(&[], ymd(10, 14), 0, &RecordFilter::all());
        assert!(board.is_empty());
        assert!(board.next_active_date.is_none());
    }

    #[test]
    fn test_month_and_search() {
        let records = records();
        let october = month(&records, 2026, 10, &RecordFilter::all()).unwrap();
        assert_eq!(october.len(), 5);
        assert!(search(&records, "a").is_empty());
    }
}
