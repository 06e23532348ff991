use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::app::ports::LineSourcePort;
use crate::app::valuation_use_case::{BatchOutcome, ValuationUseCase};
use crate::config::PipelineOptions;
use crate::constants::is_local_runner;
use crate::domain::ListingRecord;
use crate::infra::ndjson_sink::{read_ndjson, write_ndjson};

/// Result of one submitted job
#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    pub run_id: Uuid,
    pub job_name: String,
    pub runner: String,
    pub files: Vec<String>,
    #[serde(flatten)]
    pub outcome: BatchOutcome,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Executes a valuation job. Receives the pipeline options explicitly.
#[async_trait]
pub trait ExecutionRuntime: Send + Sync {
    async fn submit(
        &self,
        options: &PipelineOptions,
        source: &dyn LineSourcePort,
        use_case: &ValuationUseCase,
    ) -> Result<JobSummary>;
}

/// In-process runtime.
///
/// Inputs are pulled `batch_size` lines at a time. Each valued batch is
/// staged as NDJSON under `temp_location/<job_name>/<run_id>/` and loaded
/// into the sink from the staged file; the staging directory is removed when
/// the job ends, successfully or not. A run manifest is kept under
/// `staging_location/<job_name>/`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalRuntime;

impl LocalRuntime {
    pub fn new() -> Self {
        Self
    }
}

fn run_dir(root: &str, job_name: &str, run_id: &Uuid) -> PathBuf {
    Path::new(root).join(job_name).join(run_id.to_string())
}

fn manifest_path(options: &PipelineOptions, run_id: &Uuid) -> PathBuf {
    Path::new(&options.staging_location)
        .join(&options.job_name)
        .join(format!("run-{}.json", run_id))
}

#[derive(Serialize)]
struct RunManifest<'a> {
    options: &'a PipelineOptions,
    summary: &'a JobSummary,
}

#[async_trait]
impl ExecutionRuntime for LocalRuntime {
    #[instrument(skip_all, fields(job = %options.job_name))]
    async fn submit(
        &self,
        options: &PipelineOptions,
        source: &dyn LineSourcePort,
        use_case: &ValuationUseCase,
    ) -> Result<JobSummary> {
        if !is_local_runner(&options.runner) {
            warn!(runner = %options.runner, "Runner is not available in-process; executing locally");
        }
        info!(
            project = %options.project,
            region = %options.region,
            runner = %options.runner,
            "Submitting job"
        );

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let temp_dir = run_dir(&options.temp_location, &options.job_name, &run_id);
        tokio::fs::create_dir_all(&temp_dir)
            .await
            .with_context(|| format!("Failed to create temp location {}", temp_dir.display()))?;

        let loaded = load_inputs(options, source, use_case, &temp_dir).await;
        if let Err(e) = tokio::fs::remove_dir_all(&temp_dir).await {
            warn!(path = %temp_dir.display(), error = %e, "Failed to clean temp location");
        }
        let (files, total) = loaded?;

        let summary = JobSummary {
            run_id,
            job_name: options.job_name.clone(),
            runner: options.runner.clone(),
            files,
            outcome: total,
            started_at,
            finished_at: Utc::now(),
        };

        let manifest = manifest_path(options, &run_id);
        if let Some(dir) = manifest.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let body = serde_json::to_vec_pretty(&RunManifest {
            options,
            summary: &summary,
        })?;
        tokio::fs::write(&manifest, body)
            .await
            .with_context(|| format!("Failed to write manifest {}", manifest.display()))?;

        info!(
            run_id = %summary.run_id,
            written = summary.outcome.written,
            manifest = %manifest.display(),
            "Job finished"
        );
        Ok(summary)
    }
}

async fn load_inputs(
    options: &PipelineOptions,
    source: &dyn LineSourcePort,
    use_case: &ValuationUseCase,
    temp_dir: &Path,
) -> Result<(Vec<String>, BatchOutcome)> {
    let files = source.list_inputs().await?;
    let batch_size = options.batch_size.max(1);
    let mut total = BatchOutcome::default();
    let mut batch_index = 0usize;

    for input in &files {
        let mut reader = source.open_input(input).await?;
        let mut file_outcome = BatchOutcome::default();

        loop {
            let lines = reader.next_batch(batch_size).await?;
            if lines.is_empty() {
                break;
            }

            let (valued, mut outcome) = use_case.transform(&lines);
            if !valued.is_empty() {
                let staged = stage_batch(temp_dir, batch_index, &valued).await?;
                batch_index += 1;
                outcome.written = use_case.load(&staged).await?;
            }
            file_outcome += outcome;
        }

        info!(
            input = %input,
            read = file_outcome.read,
            parse_failures = file_outcome.parse_failures,
            filtered = file_outcome.filtered,
            written = file_outcome.written,
            "Processed input"
        );
        total += file_outcome;
    }

    use_case.flush().await?;
    Ok((files, total))
}

/// Write one valued batch to the staging directory and read back what the
/// sink will load.
async fn stage_batch(
    temp_dir: &Path,
    index: usize,
    records: &[ListingRecord],
) -> Result<Vec<ListingRecord>> {
    let path = temp_dir.join(format!("batch-{:05}.ndjson", index));

    let mut encoded = Vec::new();
    write_ndjson(&mut encoded, records)?;
    tokio::fs::write(&path, encoded)
        .await
        .with_context(|| format!("Failed to stage batch at {}", path.display()))?;

    let staged = tokio::fs::read(&path)
        .await
        .with_context(|| format!("Failed to read staged batch {}", path.display()))?;
    Ok(read_ndjson(staged.as_slice())?)
}
