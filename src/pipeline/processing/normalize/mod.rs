use csv::ReaderBuilder;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::error;

use crate::constants::{GENERATED_ID_PREFIX, HEADER_ID_LITERAL};
use crate::domain::ListingRecord;
use crate::observability::metrics;

pub mod classify;
pub mod rules;

pub use classify::classify;
pub use rules::{PriceRejection, PriceRule, DEFAULT_PRICE_RULES};

/// Hex digits of the content hash kept in a synthesized id
const GENERATED_ID_HEX_LEN: usize = 16;
/// Joins fields before hashing so `["a,b"]` and `["a", "b"]` differ
const FIELD_SEPARATOR: &str = "\u{1f}";

/// Why a raw line could not be split into fields
#[derive(Error, Debug)]
pub enum RowParseError {
    #[error("malformed CSV line: {0}")]
    Csv(#[from] csv::Error),
    #[error("line contains no fields")]
    Empty,
    #[error(transparent)]
    Price(#[from] PriceRejection),
}

/// Result of normalizing one line
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedLine {
    pub record: ListingRecord,
    /// The line could not be parsed and `record` holds defaults only
    pub parse_failed: bool,
}

/// Trait for turning one raw delimited line into a listing record
pub trait Normalizer: Send + Sync {
    /// Never fails: a line that cannot be parsed yields the all-default record.
    fn normalize_line(&self, line: &str, source_tag: Option<&str>) -> NormalizedLine;

    fn normalize(&self, line: &str, source_tag: Option<&str>) -> ListingRecord {
        self.normalize_line(line, source_tag).record
    }
}

/// Heuristic normalizer for schema-less listing exports.
///
/// Fields are picked by position: price through the rule table, id from
/// field 0, name from field 1. Room type and region are never populated.
#[derive(Debug, Clone)]
pub struct RowNormalizer {
    price_rules: Vec<PriceRule>,
}

impl Default for RowNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl RowNormalizer {
    pub fn new() -> Self {
        Self {
            price_rules: DEFAULT_PRICE_RULES.to_vec(),
        }
    }

    /// Use a custom price rule table, evaluated in the given order
    pub fn with_price_rules(price_rules: Vec<PriceRule>) -> Self {
        Self { price_rules }
    }

    fn build_record(
        &self,
        fields: &[String],
        source_tag: Option<&str>,
    ) -> Result<ListingRecord, RowParseError> {
        let mut record = ListingRecord::with_defaults(source_tag);

        if let Some(price) = rules::extract_price(&self.price_rules, fields)? {
            record.price = price;
        }

        record.id = match fields.first() {
            Some(first) if !first.is_empty() && first != HEADER_ID_LITERAL => first.clone(),
            _ => generated_id(fields),
        };

        if let Some(name) = fields.get(1) {
            record.name = name.clone();
        }

        record.property_type = classify(&record.name, record.price);
        Ok(record)
    }
}

impl Normalizer for RowNormalizer {
    fn normalize_line(&self, line: &str, source_tag: Option<&str>) -> NormalizedLine {
        match parse_row(line).and_then(|fields| self.build_record(&fields, source_tag)) {
            Ok(record) => {
                metrics::normalize::record_normalized();
                NormalizedLine {
                    record,
                    parse_failed: false,
                }
            }
            Err(e) => {
                error!(error = %e, source = source_tag.unwrap_or("unknown"), "Error parsing row");
                metrics::normalize::parse_failed();
                NormalizedLine {
                    record: ListingRecord::with_defaults(source_tag),
                    parse_failed: true,
                }
            }
        }
    }
}

/// Normalize with the default rule table
pub fn normalize(line: &str, source_tag: Option<&str>) -> ListingRecord {
    RowNormalizer::new().normalize(line, source_tag)
}

/// Split one line into fields under standard CSV quoting.
pub fn parse_row(line: &str) -> Result<Vec<String>, RowParseError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());

    match reader.records().next() {
        Some(Ok(record)) => Ok(record.iter().map(str::to_string).collect()),
        Some(Err(e)) => Err(e.into()),
        None => Err(RowParseError::Empty),
    }
}

/// Content-derived id for rows without a usable id field.
///
/// Deterministic across runs, but only weakly unique: identical rows share
/// an id, and distinct rows may collide on the truncated digest.
pub fn generated_id(fields: &[String]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(fields.join(FIELD_SEPARATOR).as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("{}{}", GENERATED_ID_PREFIX, &digest[..GENERATED_ID_HEX_LEN])
}
