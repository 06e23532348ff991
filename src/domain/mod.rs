use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::UNKNOWN;

/// Property category inferred from the listing name and nightly price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum PropertyType {
    #[default]
    Regular,
    Luxury,
    Desert,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Regular => "regular",
            PropertyType::Luxury => "luxury",
            PropertyType::Desert => "desert",
        }
    }

    /// Case-insensitive label lookup. Anything outside the known set is `Regular`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "luxury" => PropertyType::Luxury,
            "desert" => PropertyType::Desert,
            _ => PropertyType::Regular,
        }
    }
}

impl From<String> for PropertyType {
    fn from(label: String) -> Self {
        PropertyType::from_label(&label)
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Income-capitalization estimate attached by the valuation stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Valuation {
    pub estimated_occupancy: f64,
    pub cap_rate: f64,
    pub estimated_annual_revenue: f64,
    pub estimated_property_value: f64,
}

/// A listing in the common schema shared by every source export.
///
/// Created by the normalizer from one raw line, completed once by the
/// estimator (which only fills `valuation`), then handed to a sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub room_type: String,
    pub property_type: PropertyType,
    pub region: String,
    pub dataset_source: String,
    #[serde(flatten, default, skip_serializing_if = "Option::is_none")]
    pub valuation: Option<Valuation>,
}

impl ListingRecord {
    /// The all-default record. Only the provenance tag is carried over.
    pub fn with_defaults(source_tag: Option<&str>) -> Self {
        Self {
            id: UNKNOWN.to_string(),
            name: String::new(),
            price: 0.0,
            room_type: UNKNOWN.to_string(),
            property_type: PropertyType::Regular,
            region: UNKNOWN.to_string(),
            dataset_source: source_tag.unwrap_or(UNKNOWN).to_string(),
            valuation: None,
        }
    }
}

/// Column types of the analytical sink table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    String,
    Float,
}

impl ColumnType {
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::String => "TEXT",
            ColumnType::Float => "REAL",
        }
    }
}

/// Sink schema, in column order.
pub const LISTING_COLUMNS: [(&str, ColumnType); 11] = [
    ("id", ColumnType::String),
    ("name", ColumnType::String),
    ("price", ColumnType::Float),
    ("room_type", ColumnType::String),
    ("property_type", ColumnType::String),
    ("region", ColumnType::String),
    ("dataset_source", ColumnType::String),
    ("estimated_occupancy", ColumnType::Float),
    ("cap_rate", ColumnType::Float),
    ("estimated_annual_revenue", ColumnType::Float),
    ("estimated_property_value", ColumnType::Float),
];

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_label_falls_back_to_regular() {
        assert_eq!(PropertyType::from_label("LUXURY"), PropertyType::Luxury);
        assert_eq!(PropertyType::from_label("desert"), PropertyType::Desert);
        assert_eq!(PropertyType::from_label("castle"), PropertyType::Regular);

        let parsed: PropertyType = serde_json::from_value(json!("treehouse")).unwrap();
        assert_eq!(parsed, PropertyType::Regular);
    }

    #[test]
    fn test_record_serializes_flat_schema() {
        let mut record = ListingRecord::with_defaults(Some("listings.csv"));
        record.property_type = PropertyType::Desert;
        record.valuation = Some(Valuation {
            estimated_occupancy: 0.55,
            cap_rate: 0.045,
            estimated_annual_revenue: 100.0,
            estimated_property_value: 2000.0,
        });

        let value = serde_json::to_value(&record).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), LISTING_COLUMNS.len());
        for (column, _) in LISTING_COLUMNS {
            assert!(object.contains_key(column), "missing column {}", column);
        }
        assert_eq!(value["property_type"], json!("desert"));
        assert_eq!(value["dataset_source"], json!("listings.csv"));
    }

    #[test]
    fn test_unvalued_record_omits_derived_fields() {
        let record = ListingRecord::with_defaults(None);
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("cap_rate").is_none());
        assert_eq!(value["id"], json!("unknown"));
        assert_eq!(value["dataset_source"], json!("unknown"));
    }
}
