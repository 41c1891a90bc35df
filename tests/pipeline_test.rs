//! End-to-end tests of the offline pipeline: rows → records → board

mod common;

use std::fs;

use common::ymd;
use delivery_board::board::{self, Board};
use delivery_board::filter::{RecordFilter, Selection};
use delivery_board::mapper::RecordMapper;
use delivery_board::models::{Anchor, DeliveryTime, Record};
use delivery_board::parser::RowParser;
use delivery_board::utils::error::MappingError;

fn load_fixture(filename: &str) -> String {
    let path = format!("tests/fixtures/feeds/{filename}");
    fs::read_to_string(&path).unwrap_or_else(|_| panic!("Failed to load fixture: {path}"))
}

fn map_text(text: &str) -> Result<Vec<Record>, MappingError> {
    let rows = RowParser::default().parse(text).unwrap();
    RecordMapper::new().map(&rows).map(|outcome| outcome.records)
}

#[test]
fn test_fixture_maps_and_sorts() {
    let rows = RowParser::default().parse(&load_fixture("schedule.csv")).unwrap();
    let outcome = RecordMapper::new().map(&rows).unwrap();

    assert_eq!(outcome.stats.rows_seen, 9);
    assert_eq!(outcome.stats.blank_rows, 1);
    assert_eq!(outcome.stats.undated_rows, 1);
    assert_eq!(outcome.records.len(), 7);

    let order: Vec<(String, &str)> = outcome
        .records
        .iter()
        .map(|r| (r.date.format("%d/%m").to_string(), r.customer.as_str()))
        .collect();
    assert_eq!(
        order,
        vec![
            ("12/10".to_string(), "JC Kitchens"),
            ("13/10".to_string(), "KWL Ltd"),
            ("14/10".to_string(), "Acme"),
            ("14/10".to_string(), "Bee Interiors"),
            ("14/10".to_string(), "Acme"),
            ("19/10".to_string(), "JC Kitchens"),
            ("04/11".to_string(), "KWL Ltd"),
        ]
    );

    // unreadable time sorts last within its day
    assert_eq!(outcome.records[4].time, "TBC");
    assert_eq!(outcome.records[4].time_minutes, DeliveryTime::Unknown);

    let first = &outcome.records[0];
    assert_eq!(first.address, "Unit 4, Mill Lane");
    assert_eq!(first.postcode, "LS1 4AB");
    assert_eq!(first.manufacturing.door_colour, "Graphite");
    assert_eq!(first.manufacturing.man_hours, "3.5");

    assert_eq!(outcome.records[6].time_minutes, DeliveryTime::At(14 * 60 + 15));
}

#[test]
fn test_time_forms_normalize_alike() {
    let text = [
        "Date,Customer,Address,Time",
        "14/10/2026,A,x,09:30",
        "14/10/2026,B,x,9:30AM",
        "14/10/2026,C,x,09.30",
        "14/10/2026,D,x,0930",
    ]
    .join("\n");

    let records = map_text(&text).unwrap();
    assert!(records.iter().all(|r| r.time_minutes == DeliveryTime::At(570)));
}

#[test]
fn test_address_aliases_are_equivalent() {
    let long = map_text("Date,Customer,Delivery Address,Time\n14/10/2026,A,1 High St,10:00").unwrap();
    let short = map_text("Date,Customer,Address,Time\n14/10/2026,A,1 High St,10:00").unwrap();
    assert_eq!(long, short);
}

#[test]
fn test_missing_time_column_is_reported() {
    let err = map_text(&load_fixture("missing_time.csv")).unwrap_err();
    assert_eq!(err.missing_fields(), &["time".to_string()]);
    assert!(err.to_string().contains("time"));
}

#[test]
fn test_mapping_is_deterministic() {
    let text = load_fixture("schedule.csv");
    assert_eq!(map_text(&text).unwrap(), map_text(&text).unwrap());
}

#[test]
fn test_board_from_fixture() {
    let records = map_text(&load_fixture("schedule.csv")).unwrap();
    let today = ymd(10, 14);
    let board = Board::from_records(&records, today, 0, &RecordFilter::all());

    assert_eq!(board.today.len(), 3);
    assert_eq!(board.today.items[0].customer, "Acme");
    assert_eq!(board.yesterday.len(), 1);

    // nothing on Thursday, so the next active day is the following Monday
    assert_eq!(board.next_active_date, Some(ymd(10, 19)));
    assert_eq!(board.next_active.label, "Monday's Deliveries");

    // rest of this week is empty; next week holds only the Monday, which is
    // shown on its own, so the week view lands there with nothing left
    assert_eq!(
        board.week.anchor,
        Anchor::Range {
            start: ymd(10, 19),
            end: ymd(10, 25),
        }
    );
    assert!(board.week.is_empty());
}

#[test]
fn test_week_fallback_skips_to_busy_week() {
    let records = vec![
        common::record(ymd(10, 12), "Earlier", 600),
        common::record(ymd(11, 4), "ThreeWeeksOut", 600),
        common::record(ymd(11, 5), "ThreeWeeksOut", 660),
    ];
    let today = ymd(10, 14);

    let board = Board::from_records(&records, today, 0, &RecordFilter::all());

    assert_eq!(board.next_active_date, Some(ymd(11, 4)));
    assert_eq!(board.week.label, "Deliveries Week Commencing 02 Nov 2026");
    assert!(board.week.items.iter().all(|r| r.date != ymd(11, 4)));
    assert_eq!(board.week.len(), 1);
}

#[test]
fn test_filters_compose() {
    let records = map_text(&load_fixture("schedule.csv")).unwrap();
    let today = ymd(10, 14);

    let by_carrier = RecordFilter::new(Selection::All, Selection::Only("Benji".into()));
    let board = Board::from_records(&records, today, 0, &by_carrier);
    assert_eq!(board.today.len(), 1);
    assert_eq!(board.today.items[0].customer, "Bee Interiors");

    let both = RecordFilter::new(
        Selection::Only("Acme".into()),
        Selection::Only("Collection".into()),
    );
    let board = Board::from_records(&records, today, 0, &both);
    assert_eq!(board.today.len(), 1);
    assert_eq!(board.today.items[0].address, "1 High St");

    assert_eq!(
        board.carriers,
        vec!["AAA", "AWS", "Benji", "Collection", "RD"]
    );
}

#[test]
fn test_postcode_search_groups() {
    let records = map_text(&load_fixture("schedule.csv")).unwrap();

    let groups = board::search(&records, "ls1");
    let postcodes: Vec<&str> = groups.iter().map(|g| g.postcode.as_str()).collect();
    assert_eq!(postcodes, vec!["LS1 4AB", "LS1 9ZZ"]);

    let acme = &groups[1];
    assert_eq!(acme.count(), 2);
    assert_eq!(acme.next().unwrap().time, "0930");

    assert!(board::search(&records, "L").is_empty());
}

#[test]
fn test_month_window() {
    let records = map_text(&load_fixture("schedule.csv")).unwrap();
    let november = board::month(&records, 2026, 11, &RecordFilter::all()).unwrap();
    assert_eq!(november.len(), 1);
    assert_eq!(november.label, "Deliveries: November 2026");
}
