use tracing::debug;

use crate::domain::ListingRecord;
use crate::observability::metrics;

/// Decides whether a normalized record continues to valuation
pub trait RecordFilter: Send + Sync {
    fn accepts(&self, record: &ListingRecord) -> bool;
}

/// Drops records whose nightly price is not strictly positive.
#[derive(Debug, Clone, Copy, Default)]
pub struct PriceFilter;

impl RecordFilter for PriceFilter {
    fn accepts(&self, record: &ListingRecord) -> bool {
        let keep = record.price > 0.0;
        if !keep {
            debug!(id = %record.id, price = record.price, "Dropping record without a positive price");
            metrics::filter::record_dropped();
        }
        keep
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::normalize::normalize;

    #[test]
    fn test_zero_price_is_dropped() {
        let record = normalize("id,name,price_field", None);
        assert_eq!(record.price, 0.0);
        assert!(!PriceFilter.accepts(&record));
    }

    #[test]
    fn test_positive_price_is_kept() {
        assert!(PriceFilter.accepts(&normalize("A1,Room,0.01", None)));
    }

    #[test]
    fn test_negative_price_is_dropped() {
        let mut record = normalize("A1,Room,10", None);
        record.price = -5.0;
        assert!(!PriceFilter.accepts(&record));
    }
}
