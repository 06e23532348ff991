use anyhow::Result;
use serde::Serialize;
use std::ops::AddAssign;
use std::sync::Arc;
use tracing::debug;

use crate::app::ports::{ListingSinkPort, RawLine};
use crate::domain::ListingRecord;
use crate::observability::metrics;
use crate::pipeline::processing::{
    Estimator, Normalizer, PriceFilter, RecordFilter, RowNormalizer, ValuationEstimator,
};

/// Counts for one processed batch of raw lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    pub read: usize,
    pub parse_failures: usize,
    pub filtered: usize,
    pub written: usize,
}

impl AddAssign for BatchOutcome {
    fn add_assign(&mut self, other: Self) {
        self.read += other.read;
        self.parse_failures += other.parse_failures;
        self.filtered += other.filtered;
        self.written += other.written;
    }
}

/// Use case for turning raw export lines into valued listings:
/// normalize, drop unpriced records, estimate, then append to the sink.
pub struct ValuationUseCase {
    normalizer: Box<dyn Normalizer>,
    filter: Box<dyn RecordFilter>,
    estimator: Box<dyn Estimator>,
    output: Arc<dyn ListingSinkPort>,
}

impl ValuationUseCase {
    pub fn new(
        normalizer: Box<dyn Normalizer>,
        filter: Box<dyn RecordFilter>,
        estimator: Box<dyn Estimator>,
        output: Arc<dyn ListingSinkPort>,
    ) -> Self {
        Self {
            normalizer,
            filter,
            estimator,
            output,
        }
    }

    /// Create a use case with the default stages
    pub fn with_default_stages(output: Arc<dyn ListingSinkPort>) -> Self {
        Self::new(
            Box::new(RowNormalizer::new()),
            Box::new(PriceFilter),
            Box::new(ValuationEstimator::new()),
            output,
        )
    }

    /// Run the pure stages over a batch. Nothing is written.
    ///
    /// `written` in the returned outcome is left at zero.
    pub fn transform(&self, lines: &[RawLine]) -> (Vec<ListingRecord>, BatchOutcome) {
        let mut outcome = BatchOutcome {
            read: lines.len(),
            ..BatchOutcome::default()
        };
        let mut valued = Vec::with_capacity(lines.len());

        for line in lines {
            let normalized = self
                .normalizer
                .normalize_line(&line.text, line.source_tag.as_deref());
            if normalized.parse_failed {
                outcome.parse_failures += 1;
            }

            if !self.filter.accepts(&normalized.record) {
                outcome.filtered += 1;
                continue;
            }

            valued.push(self.estimator.estimate(normalized.record));
        }

        debug!(
            read = outcome.read,
            kept = valued.len(),
            filtered = outcome.filtered,
            "Transformed batch"
        );
        (valued, outcome)
    }

    /// Append already valued records to the sink
    pub async fn load(&self, records: &[ListingRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        self.output.write_batch(records).await?;
        metrics::sink::batch_written(records.len());
        Ok(records.len())
    }

    pub async fn flush(&self) -> Result<()> {
        self.output.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PropertyType;
    use crate::infra::memory_sink::InMemoryListingSink;

    fn lines(texts: &[&str]) -> Vec<RawLine> {
        texts
            .iter()
            .map(|text| RawLine::new(*text, Some("listings.csv")))
            .collect()
    }

    async fn run_batch(use_case: &ValuationUseCase, lines: &[RawLine]) -> BatchOutcome {
        let (valued, mut outcome) = use_case.transform(lines);
        outcome.written = use_case.load(&valued).await.unwrap();
        outcome
    }

    #[tokio::test]
    async fn test_batch_filters_and_values() {
        let sink = Arc::new(InMemoryListingSink::new());
        let use_case = ValuationUseCase::with_default_stages(sink.clone());

        let outcome = run_batch(
            &use_case,
            &lines(&[
                "H1,Luxury Villa,,,,,,,,9000",
                "id,name,price_field",
                "S1,Sahara Camp,200",
                "",
            ]),
        )
        .await;

        assert_eq!(
            outcome,
            BatchOutcome {
                read: 4,
                parse_failures: 1,
                filtered: 2,
                written: 2,
            }
        );

        let stored = sink.records().await;
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].property_type, PropertyType::Luxury);
        assert_eq!(stored[1].property_type, PropertyType::Desert);
        assert!(stored.iter().all(|r| r.valuation.is_some()));
        assert!(stored.iter().all(|r| r.dataset_source == "listings.csv"));
    }

    #[tokio::test]
    async fn test_all_filtered_batch_writes_nothing() {
        let sink = Arc::new(InMemoryListingSink::new());
        let use_case = ValuationUseCase::with_default_stages(sink.clone());

        let outcome = run_batch(&use_case, &lines(&["A,No price", "B,Free stay,0"])).await;

        assert_eq!(outcome.filtered, 2);
        assert_eq!(outcome.written, 0);
        assert!(sink.records().await.is_empty());
        assert_eq!(sink.batches_written().await, 0);
    }

    #[test]
    fn test_outcomes_accumulate() {
        let mut total = BatchOutcome::default();
        total += BatchOutcome { read: 3, parse_failures: 1, filtered: 1, written: 2 };
        total += BatchOutcome { read: 2, parse_failures: 0, filtered: 2, written: 0 };
        assert_eq!(total, BatchOutcome { read: 5, parse_failures: 1, filtered: 3, written: 2 });
    }
}
