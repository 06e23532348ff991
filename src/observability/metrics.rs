//! Stage metrics for the valuation pipeline.
//!
//! Recording functions are safe to call before [`init`]: without an
//! installed recorder the `metrics` macros are no-ops, which is what unit
//! tests rely on.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::fmt;
use std::sync::OnceLock;
use tracing::info;

/// All metric names used in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    NormalizeRecords,
    NormalizeParseFailures,
    FilterDropped,
    EstimateRecords,
    EstimatePropertyValue,
    SinkRecordsWritten,
    SinkBatchSize,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::NormalizeRecords => "rv_normalize_records_total",
            MetricName::NormalizeParseFailures => "rv_normalize_parse_failures_total",
            MetricName::FilterDropped => "rv_filter_dropped_total",
            MetricName::EstimateRecords => "rv_estimate_records_total",
            MetricName::EstimatePropertyValue => "rv_estimate_property_value",
            MetricName::SinkRecordsWritten => "rv_sink_records_written_total",
            MetricName::SinkBatchSize => "rv_sink_batch_size",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Calling it twice is harmless.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {}", e))?;
    METRICS_HANDLE.set(handle).ok();

    info!("Metrics system initialized");
    Ok(())
}

/// Current metrics in Prometheus text format, if the recorder is installed
pub fn render() -> Option<String> {
    METRICS_HANDLE.get().map(|handle| handle.render())
}

pub mod normalize {
    use super::MetricName;

    pub fn record_normalized() {
        ::metrics::counter!(MetricName::NormalizeRecords.as_str()).increment(1);
    }

    pub fn parse_failed() {
        ::metrics::counter!(MetricName::NormalizeParseFailures.as_str()).increment(1);
    }
}

pub mod filter {
    use super::MetricName;

    pub fn record_dropped() {
        ::metrics::counter!(MetricName::FilterDropped.as_str()).increment(1);
    }
}

pub mod estimate {
    use super::MetricName;
    use crate::domain::PropertyType;

    /// Record a valuation, labelled by property type
    pub fn record_valued(property_type: PropertyType, property_value: f64) {
        ::metrics::counter!(
            MetricName::EstimateRecords.as_str(),
            "property_type" => property_type.as_str()
        )
        .increment(1);
        ::metrics::histogram!(MetricName::EstimatePropertyValue.as_str()).record(property_value);
    }
}

pub mod sink {
    use super::MetricName;

    pub fn batch_written(batch_size: usize) {
        ::metrics::histogram!(MetricName::SinkBatchSize.as_str()).record(batch_size as f64);
        ::metrics::counter!(MetricName::SinkRecordsWritten.as_str()).increment(batch_size as u64);
    }
}
