//! Row to record mapping
//!
//! This module turns parsed rows into the canonical, sorted record set:
//!
//! - [`columns`] - header alias resolution and required column validation
//! - [`datetime`] - date and time normalization
//!
//! Rows that cannot become a record (blank rows, rows without a readable
//! date) are skipped and counted, never reported as errors.

pub mod columns;
pub mod datetime;

pub use columns::{ColumnMap, Field};
pub use datetime::{parse_date, parse_time, DateForm, TimeForm};

use serde::Serialize;

use crate::models::{sort_schedule, Manufacturing, Record};
use crate::utils::error::MappingError;
use crate::utils::normalize_text;

/// Counters describing one mapping pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MappingStats {
    /// Data rows seen (header excluded)
    pub rows_seen: usize,
    /// Rows whose cells were all blank
    pub blank_rows: usize,
    /// Rows dropped because the date could not be read
    pub undated_rows: usize,
    /// Records produced
    pub records: usize,
}

impl MappingStats {
    pub fn skipped(&self) -> usize {
        self.blank_rows + self.undated_rows
    }
}

/// Result of a successful mapping pass
#[derive(Debug, Clone, Default)]
pub struct MappingOutcome {
    /// Records in canonical schedule order
    pub records: Vec<Record>,
    pub stats: MappingStats,
}

/// Maps feed rows onto [`Record`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordMapper;

impl RecordMapper {
    pub fn new() -> Self {
        Self
    }

    /// Map rows (header first) into a sorted record set
    ///
    /// # Errors
    ///
    /// Returns `MappingError::MissingColumns` when any of `date`, `customer`,
    /// `address` or `time` has no header. An input without any rows is
    /// treated as an empty header row.
    pub fn map(&self, rows: &[Vec<String>]) -> Result<MappingOutcome, MappingError> {
        let (header, data) = match rows.split_first() {
            Some((header, data)) => (header.as_slice(), data),
            None => (&[][..], &[][..]),
        };

        let columns = ColumnMap::from_headers(header)?;
        let mut stats = MappingStats::default();
        let mut records = Vec::with_capacity(data.len());

        for row in data {
            stats.rows_seen += 1;

            if row.iter().all(|c| normalize_text(c).is_empty()) {
                stats.blank_rows += 1;
                continue;
            }

            match self.map_row(&columns, row) {
                Some(record) => records.push(record),
                None => {
                    stats.undated_rows += 1;
                    tracing::trace!(row = stats.rows_seen, "Skipping row without a readable date");
                }
            }
        }

        sort_schedule(&mut records);
        stats.records = records.len();

        Ok(MappingOutcome { records, stats })
    }

    /// Build one record, or `None` when the date cannot be read
    fn map_row(&self, columns: &ColumnMap, row: &[String]) -> Option<Record> {
        let date = parse_date(&columns.cell(row, Field::Date))?;
        let time = columns.cell(row, Field::Time);
        let time_minutes = parse_time(&time);

        Some(Record {
            date,
            customer: columns.cell(row, Field::Customer),
            address: columns.cell(row, Field::Address),
            time,
            time_minutes,
            postcode: columns.cell(row, Field::Postcode),
            delivery_type: columns.cell(row, Field::DeliveryType),
            notes: columns.cell(row, Field::Notes),
            manufacturing: Manufacturing {
                door_colour: columns.cell(row, Field::DoorColour),
                base_units: columns.cell(row, Field::BaseUnits),
                wall_units: columns.cell(row, Field::WallUnits),
                base_ends: columns.cell(row, Field::BaseEnds),
                wall_ends: columns.cell(row, Field::WallEnds),
                plinths: columns.cell(row, Field::Plinths),
                worktop_colour: columns.cell(row, Field::WorktopColour),
                worktop_length: columns.cell(row, Field::WorktopLength),
                tek_length: columns.cell(row, Field::TekLength),
                man_hours: columns.cell(row, Field::ManHours),
            },
        })
    }
}
