// Valuation pipeline: record processing stages and the runtime that drives them

pub mod processing;
pub mod runtime;

use anyhow::Result;

use crate::app::valuation_use_case::ValuationUseCase;
use crate::config::AppConfig;
use crate::infra::{self, csv_source::GlobLineSource};
use runtime::{ExecutionRuntime, JobSummary, LocalRuntime};

/// Wires source, stages, sink and runtime from one configuration.
pub struct ValuationPipeline {
    config: AppConfig,
    runtime: Box<dyn ExecutionRuntime>,
}

impl ValuationPipeline {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            runtime: Box::new(LocalRuntime::new()),
        }
    }

    pub async fn run(&self) -> Result<JobSummary> {
        let source = GlobLineSource::from_config(&self.config.source);
        let sink = infra::sink_from_config(&self.config.sink)?;
        let use_case = ValuationUseCase::with_default_stages(sink);

        self.runtime
            .submit(&self.config.pipeline, &source, &use_case)
            .await
    }
}
