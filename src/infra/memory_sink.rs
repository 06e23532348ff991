use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::app::ports::ListingSinkPort;
use crate::domain::ListingRecord;
use crate::error::{PipelineError, Result};

/// In-memory sink for development/testing
#[derive(Default)]
pub struct InMemoryListingSink {
    records: Mutex<Vec<ListingRecord>>,
    batches: Mutex<usize>,
}

impl InMemoryListingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<ListingRecord> {
        self.records.lock().await.clone()
    }

    pub async fn batches_written(&self) -> usize {
        *self.batches.lock().await
    }
}

#[async_trait]
impl ListingSinkPort for InMemoryListingSink {
    async fn write_batch(&self, records: &[ListingRecord]) -> Result<()> {
        if let Some(unvalued) = records.iter().find(|r| r.valuation.is_none()) {
            return Err(PipelineError::MissingValuation(unvalued.id.clone()));
        }
        self.records.lock().await.extend_from_slice(records);
        *self.batches.lock().await += 1;
        Ok(())
    }
}
