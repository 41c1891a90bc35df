//! Read-time record filtering
//!
//! Filters never touch the record set itself. They build a predicate that
//! is applied to a bucket's items when it is read, so several consumers can
//! look at the same set through different filters at once.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::models::{Bucket, Record};
use crate::utils::normalize_text;

// ============================================================================
// Carrier labels
// ============================================================================

/// Display metadata for a recognized carrier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarrierMeta {
    /// Short text shown on a card badge
    pub icon_label: &'static str,
    /// Canonical label used in lists and filters
    pub print_label: &'static str,
    /// Long name for tooltips
    pub title: &'static str,
}

/// Look up a raw carrier-type string
pub fn carrier_meta(raw: &str) -> Option<CarrierMeta> {
    let meta = match normalize_text(raw).to_uppercase().as_str() {
        "RD TRANSPORT" => CarrierMeta {
            icon_label: "RD",
            print_label: "RD",
            title: "RD Transport",
        },
        "AWS" => CarrierMeta {
            icon_label: "AWS",
            print_label: "AWS",
            title: "AWS",
        },
        "AAA" => CarrierMeta {
            icon_label: "AAA",
            print_label: "AAA",
            title: "AAA",
        },
        "BENJI" => CarrierMeta {
            icon_label: "BENJI",
            print_label: "Benji",
            title: "Benji",
        },
        "COLLECTION" => CarrierMeta {
            icon_label: "COLLECTION",
            print_label: "Collection",
            title: "Collection",
        },
        _ => return None,
    };
    Some(meta)
}

/// Canonical carrier label; unrecognized text passes through normalized
pub fn carrier_label(raw: &str) -> String {
    carrier_meta(raw)
        .map(|m| m.print_label.to_string())
        .unwrap_or_else(|| normalize_text(raw))
}

// ============================================================================
// Customer groups
// ============================================================================

/// Customer grouping used for badges and print filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CustomerGroup {
    Jc,
    Kwl,
    Other,
}

/// Badge colours for a customer group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgeStyle {
    pub background: &'static str,
    pub foreground: &'static str,
}

impl CustomerGroup {
    /// Classify a raw customer name by substring
    pub fn classify(customer: &str) -> Self {
        let upper = customer.to_uppercase();
        if upper.contains("JC") {
            Self::Jc
        } else if upper.contains("KWL") {
            Self::Kwl
        } else {
            Self::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jc => "JC",
            Self::Kwl => "KWL",
            Self::Other => "OTHER",
        }
    }

    pub fn badge(&self) -> BadgeStyle {
        match self {
            Self::Jc => BadgeStyle {
                background: "#E53935",
                foreground: "#ffffff",
            },
            Self::Kwl => BadgeStyle {
                background: "#1E88E5",
                foreground: "#ffffff",
            },
            Self::Other => BadgeStyle {
                background: "#E8DFC8",
                foreground: "#2B2B2B",
            },
        }
    }
}

/// Badge colours for a customer name
///
/// A name containing both markers takes the KWL badge even though it
/// classifies into the JC group.
pub fn badge_style(customer: &str) -> BadgeStyle {
    let upper = customer.to_uppercase();
    if upper.contains("KWL") {
        CustomerGroup::Kwl.badge()
    } else {
        CustomerGroup::classify(customer).badge()
    }
}

// ============================================================================
// Filters
// ============================================================================

/// One filter dimension: everything, or one exact label
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Selection {
    #[default]
    All,
    Only(String),
}

impl Selection {
    /// Selection from an optional label; `None` and "all" select everything
    pub fn from_option(label: Option<&str>) -> Self {
        match label {
            None => Self::All,
            Some(l) => l.parse().unwrap_or_default(),
        }
    }

    pub fn accepts(&self, value: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(label) => label == value,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl FromStr for Selection {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = normalize_text(s);
        if label.is_empty() || label.eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            Ok(Self::Only(label))
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("ALL"),
            Self::Only(label) => f.write_str(label),
        }
    }
}

/// Customer and carrier filter applied at read time
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecordFilter {
    pub customer: Selection,
    pub carrier: Selection,
}

impl RecordFilter {
    pub fn new(customer: Selection, carrier: Selection) -> Self {
        Self { customer, carrier }
    }

    /// Filter that keeps every record
    pub fn all() -> Self {
        Self::default()
    }

    pub fn is_pass_through(&self) -> bool {
        self.customer.is_all() && self.carrier.is_all()
    }

    /// Whether `record` passes both dimensions
    pub fn matches(&self, record: &Record) -> bool {
        self.customer.accepts(&normalize_text(&record.customer))
            && self.carrier.accepts(&carrier_label(&record.delivery_type))
    }

    /// Filtered view of a bucket; the bucket itself is left untouched
    pub fn apply<'a>(&self, bucket: &Bucket<'a>) -> Bucket<'a> {
        if self.is_pass_through() {
            return bucket.clone();
        }
        bucket.retain_view(|r| self.matches(r))
    }

    /// Filtered view of a record slice
    pub fn select<'a>(&self, records: &'a [Record]) -> Vec<&'a Record> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

/// Sorted, distinct, non-empty customer names (filter choices)
pub fn customer_options(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .map(|r| normalize_text(&r.customer))
        .filter(|c| !c.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Sorted, distinct, non-empty canonical carrier labels (filter choices)
pub fn carrier_options(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .map(|r| carrier_label(&r.delivery_type))
        .filter(|c| !c.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

// ============================================================================
// Postcode search
// ============================================================================

/// Minimum query length before a postcode search runs
pub const MIN_SEARCH_LEN: usize = 2;

/// Deliveries sharing one postcode
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostcodeGroup<'a> {
    /// Upper-cased postcode
    pub postcode: String,
    /// Matching deliveries in schedule order
    pub items: Vec<&'a Record>,
}

impl<'a> PostcodeGroup<'a> {
    /// Earliest delivery of the group
    pub fn next(&self) -> Option<&'a Record> {
        self.items.first().copied()
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }
}

/// Case-insensitive substring search over postcodes, grouped per postcode
///
/// Queries shorter than [`MIN_SEARCH_LEN`] characters return nothing.
pub fn search_postcodes<'a>(records: &'a [Record], query: &str) -> Vec<PostcodeGroup<'a>> {
    let query = query.trim().to_uppercase();
    if query.chars().count() < MIN_SEARCH_LEN {
        return Vec::new();
    }

    let mut groups: BTreeMap<String, Vec<&'a Record>> = BTreeMap::new();
    for record in records {
        let postcode = record.postcode.to_uppercase();
        if postcode.contains(&query) {
            groups.entry(postcode).or_default().push(record);
        }
    }

    groups
        .into_iter()
        .map(|(postcode, mut items)| {
            items.sort_by(|a, b| a.cmp_schedule(b));
            PostcodeGroup { postcode, items }
        })
        .collect()
}
