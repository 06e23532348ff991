use crate::constants::DAYS_PER_YEAR;
use crate::domain::{ListingRecord, PropertyType, Valuation};
use crate::observability::metrics;

/// Capitalization rate and expected occupancy for one property type
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValuationCoefficients {
    pub cap_rate: f64,
    pub occupancy: f64,
}

impl PropertyType {
    pub fn coefficients(&self) -> ValuationCoefficients {
        match self {
            PropertyType::Luxury => ValuationCoefficients {
                cap_rate: 0.035,
                occupancy: 0.60,
            },
            PropertyType::Desert => ValuationCoefficients {
                cap_rate: 0.045,
                occupancy: 0.55,
            },
            PropertyType::Regular => ValuationCoefficients {
                cap_rate: 0.05,
                occupancy: 0.65,
            },
        }
    }
}

/// Trait for attaching a valuation to a normalized record
pub trait Estimator: Send + Sync {
    /// Total: every record comes back with `valuation` set and every other
    /// field untouched.
    fn estimate(&self, record: ListingRecord) -> ListingRecord;
}

/// Income-capitalization estimator: value = yearly revenue / cap rate.
#[derive(Debug, Clone, Default)]
pub struct ValuationEstimator {
    coefficients: Option<fn(PropertyType) -> ValuationCoefficients>,
}

impl ValuationEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the built-in coefficient table
    pub fn with_coefficients(table: fn(PropertyType) -> ValuationCoefficients) -> Self {
        Self {
            coefficients: Some(table),
        }
    }

    fn coefficients_for(&self, property_type: PropertyType) -> ValuationCoefficients {
        match self.coefficients {
            Some(table) => table(property_type),
            None => property_type.coefficients(),
        }
    }

    pub fn value(&self, price: f64, property_type: PropertyType) -> Valuation {
        let ValuationCoefficients { cap_rate, occupancy } = self.coefficients_for(property_type);

        let estimated_annual_revenue = price * DAYS_PER_YEAR * occupancy;
        let estimated_property_value = if cap_rate > 0.0 {
            estimated_annual_revenue / cap_rate
        } else {
            0.0
        };

        Valuation {
            estimated_occupancy: occupancy,
            cap_rate,
            estimated_annual_revenue,
            estimated_property_value,
        }
    }
}

impl Estimator for ValuationEstimator {
    fn estimate(&self, mut record: ListingRecord) -> ListingRecord {
        let valuation = self.value(record.price, record.property_type);
        metrics::estimate::record_valued(record.property_type, valuation.estimated_property_value);
        record.valuation = Some(valuation);
        record
    }
}

/// Estimate with the built-in coefficient table
pub fn estimate(record: ListingRecord) -> ListingRecord {
    ValuationEstimator::new().estimate(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::normalize::normalize;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-6 * b.abs().max(1.0)
    }

    fn listing(price: f64, property_type: PropertyType) -> ListingRecord {
        let mut record = ListingRecord::with_defaults(Some("test.csv"));
        record.id = "L1".to_string();
        record.price = price;
        record.property_type = property_type;
        record
    }

    #[test]
    fn test_luxury_villa_valuation() {
        let record = estimate(normalize("H1,Luxury Villa,,,,,,,,9000", None));
        let valuation = record.valuation.unwrap();

        assert_eq!(valuation.cap_rate, 0.035);
        assert_eq!(valuation.estimated_occupancy, 0.60);
        assert!(approx(valuation.estimated_annual_revenue, 1_971_000.0));
        assert!(approx(valuation.estimated_property_value, 56_314_285.714285));
    }

    #[test]
    fn test_coefficient_table() {
        for (property_type, cap_rate, occupancy) in [
            (PropertyType::Luxury, 0.035, 0.60),
            (PropertyType::Desert, 0.045, 0.55),
            (PropertyType::Regular, 0.05, 0.65),
        ] {
            let valuation = estimate(listing(100.0, property_type)).valuation.unwrap();
            assert_eq!(valuation.cap_rate, cap_rate);
            assert_eq!(valuation.estimated_occupancy, occupancy);
            assert!(approx(valuation.estimated_annual_revenue, 100.0 * 365.0 * occupancy));
            assert!(approx(
                valuation.estimated_property_value,
                valuation.estimated_annual_revenue / cap_rate
            ));
        }
    }

    #[test]
    fn test_unknown_label_uses_regular_coefficients() {
        let property_type = PropertyType::from_label("igloo");
        let valuation = estimate(listing(80.0, property_type)).valuation.unwrap();
        assert_eq!(valuation.cap_rate, 0.05);
        assert_eq!(valuation.estimated_occupancy, 0.65);
    }

    #[test]
    fn test_non_positive_cap_rate_values_at_zero() {
        let estimator = ValuationEstimator::with_coefficients(|_| ValuationCoefficients {
            cap_rate: 0.0,
            occupancy: 0.5,
        });
        let valuation = estimator.estimate(listing(200.0, PropertyType::Regular)).valuation.unwrap();
        assert!(approx(valuation.estimated_annual_revenue, 36_500.0));
        assert_eq!(valuation.estimated_property_value, 0.0);
    }

    #[test]
    fn test_estimate_preserves_normalized_fields() {
        let before = listing(150.0, PropertyType::Desert);
        let after = estimate(before.clone());

        assert_eq!(after.id, before.id);
        assert_eq!(after.name, before.name);
        assert_eq!(after.price, before.price);
        assert_eq!(after.property_type, before.property_type);
        assert_eq!(after.dataset_source, before.dataset_source);
        assert!(after.valuation.is_some());
    }
}
