//! Defaults shared by configuration, normalization and the sinks.

// Record field defaults
pub const UNKNOWN: &str = "unknown";
pub const GENERATED_ID_PREFIX: &str = "generated-";
/// Field 0 carrying this literal means a header row slipped through.
pub const HEADER_ID_LITERAL: &str = "id";

// Classification
pub const LUXURY_PRICE_THRESHOLD: f64 = 5000.0;
pub const DAYS_PER_YEAR: f64 = 365.0;

// Pipeline defaults
pub const DEFAULT_PROJECT: &str = "airbnb-valuation-project";
pub const DEFAULT_RUNNER: &str = "local";
pub const DEFAULT_REGION: &str = "us-central1";
pub const DEFAULT_TEMP_LOCATION: &str = "data/tmp";
pub const DEFAULT_STAGING_LOCATION: &str = "data/staging";
pub const DEFAULT_JOB_NAME: &str = "airbnb-data-processing";
pub const DEFAULT_INPUT_PATTERN: &str = "data/raw/*.csv";
pub const DEFAULT_SINK_PATH: &str = "data/warehouse.db";
pub const DEFAULT_SINK_TABLE: &str = "airbnb_valuation.listings";
pub const DEFAULT_BATCH_SIZE: usize = 500;
pub const DEFAULT_CONFIG_PATH: &str = "pipeline.toml";
pub const LOG_DIR: &str = "logs";

/// Runner identifiers executed in-process.
pub fn is_local_runner(runner: &str) -> bool {
    matches!(
        runner.to_ascii_lowercase().as_str(),
        "local" | "direct" | "directrunner"
    )
}

/// SQLite identifiers cannot contain dots; `dataset.table` becomes `dataset_table`.
pub fn sqlite_table_name(table: &str) -> String {
    table
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_table_name() {
        assert_eq!(sqlite_table_name("airbnb_valuation.listings"), "airbnb_valuation_listings");
        assert_eq!(sqlite_table_name("plain"), "plain");
    }

    #[test]
    fn test_local_runner_aliases() {
        assert!(is_local_runner("local"));
        assert!(is_local_runner("DirectRunner"));
        assert!(!is_local_runner("DataflowRunner"));
    }
}
