// Record processing stages: normalization, filtering, and valuation

pub mod estimate;
pub mod filter;
pub mod normalize;

pub use estimate::{Estimator, ValuationEstimator};
pub use filter::{PriceFilter, RecordFilter};
pub use normalize::{Normalizer, RowNormalizer};
