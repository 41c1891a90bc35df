//! Date and time normalization
//!
//! Feed cells hold dates and times in whatever shape the sheet's editors
//! typed them. Both parsers run an ordered list of forms and accept the
//! first form that matches and validates.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::OnceLock;

use crate::models::DeliveryTime;

// ============================================================================
// Dates
// ============================================================================

/// Accepted date forms, in the order they are tried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateForm {
    /// `D/M/YYYY` or `D-M-YYYY`
    DayMonthYear,
    /// `YYYY-MM-DD`
    Iso,
    /// Common textual and timestamp layouts
    Generic,
}

impl DateForm {
    pub const ORDER: [DateForm; 3] = [Self::DayMonthYear, Self::Iso, Self::Generic];

    /// Try to read `text` in this form
    pub fn parse(&self, text: &str) -> Option<NaiveDate> {
        match self {
            Self::DayMonthYear => parse_day_month_year(text),
            Self::Iso => parse_iso(text),
            Self::Generic => parse_generic(text),
        }
    }
}

/// Date-only layouts accepted by the generic form
const GENERIC_DATE_FORMATS: &[&str] = &[
    "%d %b %Y",
    "%d %B %Y",
    "%a %d %b %Y",
    "%A %d %B %Y",
    "%a, %d %b %Y",
    "%b %d %Y",
    "%B %d %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%Y/%m/%d",
    "%m/%d/%Y",
];

/// Timestamp layouts accepted by the generic form
const GENERIC_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse a feed date cell into a calendar day
///
/// Returns `None` when no form accepts the text; such rows are dropped by
/// the mapper.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    DateForm::ORDER.iter().find_map(|form| form.parse(text))
}

fn parse_day_month_year(text: &str) -> Option<NaiveDate> {
    static DMY_RE: OnceLock<Regex> = OnceLock::new();

    let re = DMY_RE.get_or_init(|| {
        Regex::new(r"^(\d{1,2})[/\-](\d{1,2})[/\-](\d{4})$").expect("Invalid regex pattern")
    });

    let caps = re.captures(text)?;
    let day = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let year = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_iso(text: &str) -> Option<NaiveDate> {
    static ISO_RE: OnceLock<Regex> = OnceLock::new();

    let re = ISO_RE
        .get_or_init(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").expect("Invalid regex pattern"));

    let caps = re.captures(text)?;
    let year = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let day = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_generic(text: &str) -> Option<NaiveDate> {
    if let Some(date) = GENERIC_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
    {
        return Some(date);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.date_naive());
    }

    GENERIC_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|dt| dt.date())
}

// ============================================================================
// Times
// ============================================================================

/// Accepted time forms, in the order they are tried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeForm {
    /// `HH:MM`, 24-hour
    Clock24,
    /// `H[:MM] AM/PM`
    Meridiem,
    /// `H.MM`
    Dotted,
    /// Bare `HMM` or `HHMM`
    Compact,
}

impl TimeForm {
    pub const ORDER: [TimeForm; 4] = [Self::Clock24, Self::Meridiem, Self::Dotted, Self::Compact];

    fn regex(&self) -> &'static Regex {
        static CLOCK24_RE: OnceLock<Regex> = OnceLock::new();
        static MERIDIEM_RE: OnceLock<Regex> = OnceLock::new();
        static DOTTED_RE: OnceLock<Regex> = OnceLock::new();
        static COMPACT_RE: OnceLock<Regex> = OnceLock::new();

        let (cell, pattern) = match self {
            Self::Clock24 => (&CLOCK24_RE, r"^(\d{1,2}):(\d{2})$"),
            Self::Meridiem => (&MERIDIEM_RE, r"^(\d{1,2})(?::(\d{2}))?\s*(AM|PM)$"),
            Self::Dotted => (&DOTTED_RE, r"^(\d{1,2})\.(\d{2})$"),
            Self::Compact => (&COMPACT_RE, r"^(\d{1,2})(\d{2})$"),
        };

        cell.get_or_init(|| Regex::new(pattern).expect("Invalid regex pattern"))
    }

    /// Try to read upper-cased, trimmed `text` in this form
    pub fn parse(&self, text: &str) -> Option<DeliveryTime> {
        let caps = self.regex().captures(text)?;
        let hour: u32 = caps[1].parse().ok()?;
        let minute: u32 = caps
            .get(2)
            .map(|m| m.as_str().parse().ok())
            .unwrap_or(Some(0))?;

        match self {
            Self::Meridiem => {
                if !(1..=12).contains(&hour) || minute > 59 {
                    return None;
                }
                let hour = match (&caps[3], hour) {
                    ("AM", 12) => 0,
                    ("PM", h) if h != 12 => h + 12,
                    (_, h) => h,
                };
                DeliveryTime::from_hm(hour, minute)
            }
            _ => DeliveryTime::from_hm(hour, minute),
        }
    }
}

/// Parse a feed time cell into minutes since midnight
///
/// Falls back to [`DeliveryTime::Unknown`] instead of failing, so a record
/// with an unreadable time is still kept.
pub fn parse_time(text: &str) -> DeliveryTime {
    let text = text.trim().to_uppercase();
    if text.is_empty() {
        return DeliveryTime::Unknown;
    }

    TimeForm::ORDER
        .iter()
        .find_map(|form| form.parse(&text))
        .unwrap_or(DeliveryTime::Unknown)
}
