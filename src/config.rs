use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::constants;
use crate::error::{PipelineError, Result};

/// Top-level configuration file layout.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub pipeline: PipelineOptions,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub sink: SinkConfig,
}

/// Execution options handed to the runtime unchanged. Built once at startup
/// and passed by reference; nothing mutates it afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    pub project: String,
    pub runner: String,
    pub region: String,
    pub temp_location: String,
    pub staging_location: String,
    pub job_name: String,
    pub batch_size: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            project: constants::DEFAULT_PROJECT.to_string(),
            runner: constants::DEFAULT_RUNNER.to_string(),
            region: constants::DEFAULT_REGION.to_string(),
            temp_location: constants::DEFAULT_TEMP_LOCATION.to_string(),
            staging_location: constants::DEFAULT_STAGING_LOCATION.to_string(),
            job_name: constants::DEFAULT_JOB_NAME.to_string(),
            batch_size: constants::DEFAULT_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Glob pattern selecting the CSV exports to read
    pub input_pattern: String,
    /// Header lines dropped from the top of every file
    pub skip_header_lines: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            input_pattern: constants::DEFAULT_INPUT_PATTERN.to_string(),
            skip_header_lines: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    Sqlite,
    Ndjson,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    pub kind: SinkKind,
    pub path: String,
    pub table: String,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            kind: SinkKind::Sqlite,
            path: constants::DEFAULT_SINK_PATH.to_string(),
            table: constants::DEFAULT_SINK_TABLE.to_string(),
        }
    }
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            PipelineError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;

        Self::from_toml(&config_content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_falls_back_to_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [pipeline]
            job_name = "nightly-valuation"
            region = "europe-west1"

            [source]
            input_pattern = "exports/*.csv"
            "#,
        )
        .unwrap();

        assert_eq!(config.pipeline.job_name, "nightly-valuation");
        assert_eq!(config.pipeline.region, "europe-west1");
        assert_eq!(config.pipeline.runner, constants::DEFAULT_RUNNER);
        assert_eq!(config.source.input_pattern, "exports/*.csv");
        assert_eq!(config.source.skip_header_lines, 1);
        assert_eq!(config.sink.kind, SinkKind::Sqlite);
        assert_eq!(config.sink.table, constants::DEFAULT_SINK_TABLE);
    }

    #[test]
    fn test_options_pass_through_unvalidated() {
        let config = AppConfig::from_toml(
            r#"
            [pipeline]
            runner = "DataflowRunner"
            temp_location = "gs://bucket/temp"
            "#,
        )
        .unwrap();

        assert_eq!(config.pipeline.runner, "DataflowRunner");
        assert_eq!(config.pipeline.temp_location, "gs://bucket/temp");
    }

    #[test]
    fn test_unknown_sink_kind_is_rejected() {
        let result = AppConfig::from_toml(
            r#"
            [sink]
            kind = "bigquery"
            "#,
        );
        assert!(matches!(result, Err(PipelineError::Toml(_))));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = AppConfig::load("/definitely/not/here.toml");
        assert!(matches!(result, Err(PipelineError::Config(_))));
    }
}
