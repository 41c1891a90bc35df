//! Header alias resolution
//!
//! Each logical field accepts an ordered list of header aliases. Headers are
//! compared case-insensitively after normalization, and the first alias that
//! is present wins.

use std::collections::HashMap;

use crate::utils::error::MappingError;
use crate::utils::normalize_text;

/// Logical fields of a delivery record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Date,
    Customer,
    Address,
    Time,
    Notes,
    Postcode,
    DeliveryType,
    DoorColour,
    BaseUnits,
    WallUnits,
    BaseEnds,
    WallEnds,
    Plinths,
    WorktopColour,
    WorktopLength,
    TekLength,
    ManHours,
}

impl Field {
    /// Fields that must have a header for the feed to be usable
    pub const REQUIRED: [Field; 4] = [Self::Date, Self::Customer, Self::Address, Self::Time];

    /// Every field, in feed documentation order
    pub const ALL: [Field; 17] = [
        Self::Date,
        Self::Customer,
        Self::Address,
        Self::Time,
        Self::Notes,
        Self::Postcode,
        Self::DeliveryType,
        Self::DoorColour,
        Self::BaseUnits,
        Self::WallUnits,
        Self::BaseEnds,
        Self::WallEnds,
        Self::Plinths,
        Self::WorktopColour,
        Self::WorktopLength,
        Self::TekLength,
        Self::ManHours,
    ];

    /// Lower-case header aliases, in priority order
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::Date => &["date"],
            Self::Customer => &["customer"],
            Self::Address => &["delivery address", "address"],
            Self::Time => &["delivery time", "time"],
            Self::Notes => &["notes"],
            Self::Postcode => &["delivery postcode", "postcode"],
            Self::DeliveryType => &[
                "delivery type",
                "carrier",
                "courier",
                "delivery company",
                "shipper",
            ],
            Self::DoorColour => &["door colour", "door color"],
            Self::BaseUnits => &["base units"],
            Self::WallUnits => &["wall units"],
            Self::BaseEnds => &["base ends"],
            Self::WallEnds => &["wall ends"],
            Self::Plinths => &["plinths"],
            Self::WorktopColour => &["wtop colour", "worktop colour"],
            Self::WorktopLength => &["wtop length", "worktop length"],
            Self::TekLength => &["tek length", "s'back length", "sback length"],
            Self::ManHours => &["man hours", "manufacturing hours"],
        }
    }

    /// Name used in validation messages
    pub fn name(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Customer => "customer",
            Self::Address => "address",
            Self::Time => "time",
            Self::Notes => "notes",
            Self::Postcode => "postcode",
            Self::DeliveryType => "deliveryType",
            Self::DoorColour => "doorColour",
            Self::BaseUnits => "baseUnits",
            Self::WallUnits => "wallUnits",
            Self::BaseEnds => "baseEnds",
            Self::WallEnds => "wallEnds",
            Self::Plinths => "plinths",
            Self::WorktopColour => "wtopColour",
            Self::WorktopLength => "wtopLength",
            Self::TekLength => "tekLength",
            Self::ManHours => "manHours",
        }
    }

    pub fn is_required(&self) -> bool {
        Self::REQUIRED.contains(self)
    }
}

/// Resolved field to column index mapping
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    indices: HashMap<Field, usize>,
}

impl ColumnMap {
    /// Resolve every field against a header row
    ///
    /// # Errors
    ///
    /// Returns `MappingError::MissingColumns` naming every required field
    /// that has no matching header.
    pub fn from_headers(headers: &[String]) -> Result<Self, MappingError> {
        let lower: Vec<String> = headers
            .iter()
            .map(|h| normalize_text(h).to_lowercase())
            .collect();

        let mut indices = HashMap::new();
        for field in Field::ALL {
            let found = field
                .aliases()
                .iter()
                .find_map(|alias| lower.iter().position(|h| h == alias));
            if let Some(index) = found {
                indices.insert(field, index);
            }
        }

        let missing: Vec<String> = Field::REQUIRED
            .iter()
            .filter(|f| !indices.contains_key(*f))
            .map(|f| f.name().to_string())
            .collect();

        if !missing.is_empty() {
            return Err(MappingError::MissingColumns(missing));
        }

        Ok(Self { indices })
    }

    /// Column index of a field, if its header was present
    pub fn index(&self, field: Field) -> Option<usize> {
        self.indices.get(&field).copied()
    }

    pub fn has(&self, field: Field) -> bool {
        self.indices.contains_key(&field)
    }

    /// Normalized cell text for a field; empty when the column or cell is absent
    pub fn cell(&self, row: &[String], field: Field) -> String {
        self.index(field)
            .and_then(|i| row.get(i))
            .map(|c| normalize_text(c))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_case_insensitive_aliases() {
        let map =
            ColumnMap::from_headers(&headers(&["DATE", " Customer ", "Delivery Address", "TIME"]))
                .unwrap();
        assert_eq!(map.index(Field::Date), Some(0));
        assert_eq!(map.index(Field::Customer), Some(1));
        assert_eq!(map.index(Field::Address), Some(2));
        assert_eq!(map.index(Field::Time), Some(3));
        assert!(!map.has(Field::Notes));
    }

    #[test]
    fn test_first_alias_wins() {
        let map = ColumnMap::from_headers(&headers(&[
            "date",
            "customer",
            "address",
            "time",
            "delivery address",
        ]))
        .unwrap();
        assert_eq!(map.index(Field::Address), Some(4));
    }

    #[test]
    fn test_carrier_aliases() {
        let map = ColumnMap::from_headers(&headers(&[
            "date", "customer", "address", "time", "Courier",
        ]))
        .unwrap();
        assert_eq!(map.index(Field::DeliveryType), Some(4));
    }

    #[test]
    fn test_missing_reports_every_field() {
        let err = ColumnMap::from_headers(&headers(&["customer", "address"])).unwrap_err();
        assert_eq!(err.missing_fields(), &["date".to_string(), "time".to_string()]);
        assert!(err.to_string().contains("date, time"));
    }

    #[test]
    fn test_cell_defaults_to_empty() {
        let map =
            ColumnMap::from_headers(&headers(&["date", "customer", "address", "time", "notes"]))
                .unwrap();
        let short_row = headers(&["1/1/2026", "Acme"]);
        assert_eq!(map.cell(&short_row, Field::Customer), "Acme");
        assert_eq!(map.cell(&short_row, Field::Notes), "");
        assert_eq!(map.cell(&short_row, Field::Postcode), "");
    }

    #[test]
    fn test_required_flags() {
        assert!(Field::Time.is_required());
        assert!(!Field::Postcode.is_required());
    }
}
