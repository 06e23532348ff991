use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::LUXURY_PRICE_THRESHOLD;
use crate::domain::PropertyType;

static LUXURY_KEYWORDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)luxury").unwrap());
static DESERT_KEYWORDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)desert|sahara").unwrap());

/// Infer the property type from the listing name, then the nightly price.
///
/// Keyword matches win over the price threshold: a cheap "Luxury Studio" is
/// luxury and an expensive "Sahara Camp" is desert.
pub fn classify(name: &str, price: f64) -> PropertyType {
    if LUXURY_KEYWORDS.is_match(name) {
        PropertyType::Luxury
    } else if DESERT_KEYWORDS.is_match(name) {
        PropertyType::Desert
    } else if price > LUXURY_PRICE_THRESHOLD {
        PropertyType::Luxury
    } else {
        PropertyType::Regular
    }
}
