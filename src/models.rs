// Core data structures for the delivery board

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Time of day a delivery is booked for, in minutes since midnight
///
/// `Unknown` stands in for text that could not be parsed. The derived order
/// places it after every concrete time, so unparsable rows sort last within
/// their day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DeliveryTime {
    /// Parsed time, always within 0..=1439
    At(u16),
    /// Sentinel for unparsable or empty time text
    Unknown,
}

impl DeliveryTime {
    /// Last valid minute of a day
    pub const MAX_MINUTES: u16 = 24 * 60 - 1;

    /// Create from hour and minute, validating both ranges
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        if hour <= 23 && minute <= 59 {
            Some(Self::At((hour * 60 + minute) as u16))
        } else {
            None
        }
    }

    /// Minutes since midnight, `None` for the sentinel
    pub fn minutes(&self) -> Option<u16> {
        match self {
            Self::At(m) => Some(*m),
            Self::Unknown => None,
        }
    }

    /// Minutes as a float with positive infinity for the sentinel
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::At(m) => f64::from(*m),
            Self::Unknown => f64::INFINITY,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Self::At(_))
    }
}

impl fmt::Display for DeliveryTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::At(m) => write!(f, "{:02}:{:02}", m / 60, m % 60),
            Self::Unknown => write!(f, "--:--"),
        }
    }
}

/// Optional manufacturing attributes carried by operations feeds
///
/// Every field is an empty string when its column is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manufacturing {
    pub door_colour: String,
    pub base_units: String,
    pub wall_units: String,
    pub base_ends: String,
    pub wall_ends: String,
    pub plinths: String,
    pub worktop_colour: String,
    pub worktop_length: String,
    pub tek_length: String,
    pub man_hours: String,
}

/// One scheduled delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Calendar day of the delivery
    pub date: NaiveDate,
    pub customer: String,
    pub address: String,
    /// Time text as it appeared in the feed
    pub time: String,
    /// Normalized time used for ordering
    pub time_minutes: DeliveryTime,
    pub postcode: String,
    /// Raw carrier text
    pub delivery_type: String,
    pub notes: String,
    #[serde(flatten)]
    pub manufacturing: Manufacturing,
}

impl Record {
    /// Create a record with the required fields and empty optional fields
    pub fn new(
        date: NaiveDate,
        customer: impl Into<String>,
        address: impl Into<String>,
        time: impl Into<String>,
        time_minutes: DeliveryTime,
    ) -> Self {
        Self {
            date,
            customer: customer.into(),
            address: address.into(),
            time: time.into(),
            time_minutes,
            postcode: String::new(),
            delivery_type: String::new(),
            notes: String::new(),
            manufacturing: Manufacturing::default(),
        }
    }

    /// Compare by time, then customer, then address (ignores date)
    pub fn cmp_time(&self, other: &Self) -> Ordering {
        self.time_minutes
            .cmp(&other.time_minutes)
            .then_with(|| self.customer.cmp(&other.customer))
            .then_with(|| self.address.cmp(&other.address))
    }

    /// Canonical total order: date, time, customer, address
    pub fn cmp_schedule(&self, other: &Self) -> Ordering {
        self.date
            .cmp(&other.date)
            .then_with(|| self.cmp_time(other))
    }

    /// Address and postcode joined for display
    pub fn full_address(&self) -> String {
        [self.address.as_str(), self.postcode.as_str()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Sort records into the canonical schedule order
pub fn sort_schedule(records: &mut [Record]) {
    records.sort_by(Record::cmp_schedule);
}

/// Span of days a bucket covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Anchor {
    /// A single day
    Day { date: NaiveDate },
    /// An inclusive range of days
    Range { start: NaiveDate, end: NaiveDate },
    /// No day could be resolved
    Unresolved,
}

impl Anchor {
    pub fn contains(&self, date: NaiveDate) -> bool {
        match self {
            Self::Day { date: d } => *d == date,
            Self::Range { start, end } => *start <= date && date <= *end,
            Self::Unresolved => false,
        }
    }
}

/// Derived, read-only window over the record set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket<'a> {
    pub label: String,
    pub subtitle: String,
    pub anchor: Anchor,
    pub items: Vec<&'a Record>,
}

impl<'a> Bucket<'a> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Copy of this bucket keeping only the items accepted by `keep`
    pub fn retain_view<F>(&self, keep: F) -> Bucket<'a>
    where
        F: Fn(&Record) -> bool,
    {
        Bucket {
            label: self.label.clone(),
            subtitle: self.subtitle.clone(),
            anchor: self.anchor,
            items: self.items.iter().copied().filter(|r| keep(r)).collect(),
        }
    }
}
