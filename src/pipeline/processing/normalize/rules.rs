use std::fmt;
use thiserror::Error;

/// Position-based price extraction.
///
/// Source exports put the nightly price in different columns, so price is
/// found by trying `(index, validator, coercion)` rules in priority order.
/// The first rule whose field is present, passes the validator and coerces
/// wins. A field that passes the validator but does not coerce ends the
/// search: the row is treated as malformed.
#[derive(Clone, Copy)]
pub struct PriceRule {
    pub name: &'static str,
    /// 0-based field position
    pub index: usize,
    /// Character-composition check run before coercion
    pub validate: fn(&str) -> bool,
    pub coerce: fn(&str) -> Option<f64>,
}

impl fmt::Debug for PriceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriceRule")
            .field("name", &self.name)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

/// A field that passed validation but could not be coerced, e.g. `1.2.3`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("price field {raw:?} passed {rule} but could not be coerced")]
pub struct PriceRejection {
    pub rule: &'static str,
    pub raw: String,
}

pub const DEFAULT_PRICE_RULES: [PriceRule; 2] = [
    PriceRule {
        name: "plain_decimal_at_9",
        index: 9,
        validate: is_plain_decimal,
        coerce: parse_plain,
    },
    PriceRule {
        name: "grouped_decimal_at_2",
        index: 2,
        validate: is_grouped_decimal,
        coerce: parse_grouped,
    },
];

/// Non-empty, only ASCII digits and `.`, at least one digit.
pub fn is_plain_decimal(raw: &str) -> bool {
    !raw.is_empty()
        && raw.chars().all(|c| c.is_ascii_digit() || c == '.')
        && raw.chars().any(|c| c.is_ascii_digit())
}

/// Same as [`is_plain_decimal`] once thousands separators are removed.
pub fn is_grouped_decimal(raw: &str) -> bool {
    is_plain_decimal(&strip_thousands(raw))
}

fn parse_plain(raw: &str) -> Option<f64> {
    raw.parse().ok()
}

fn parse_grouped(raw: &str) -> Option<f64> {
    strip_thousands(raw).parse().ok()
}

fn strip_thousands(raw: &str) -> String {
    raw.replace(',', "")
}

/// Evaluate `rules` against `fields` in order.
///
/// `Ok(None)` when no rule matches.
pub fn extract_price(rules: &[PriceRule], fields: &[String]) -> Result<Option<f64>, PriceRejection> {
    for rule in rules {
        let Some(raw) = fields.get(rule.index) else {
            continue;
        };
        if !(rule.validate)(raw) {
            continue;
        }
        return match (rule.coerce)(raw) {
            Some(price) => Ok(Some(price)),
            None => Err(PriceRejection {
                rule: rule.name,
                raw: raw.clone(),
            }),
        };
    }

    Ok(None)
}
