use async_trait::async_trait;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

use crate::app::ports::ListingSinkPort;
use crate::domain::ListingRecord;
use crate::error::{PipelineError, Result};

/// File-based implementation of ListingSinkPort.
/// Appends one JSON object per valued listing.
pub struct NdjsonListingSink {
    writer: Mutex<BufWriter<File>>,
}

impl NdjsonListingSink {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        info!(path = %path.display(), "Appending valued listings as NDJSON");

        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }
}

/// Write records as NDJSON lines to any writer.
///
/// The batch is checked and serialized before anything reaches `writer`, so
/// a rejected batch leaves no partial rows behind.
pub fn write_ndjson<W: Write>(writer: &mut W, records: &[ListingRecord]) -> Result<()> {
    if let Some(unvalued) = records.iter().find(|r| r.valuation.is_none()) {
        return Err(PipelineError::MissingValuation(unvalued.id.clone()));
    }

    let mut encoded = Vec::new();
    for record in records {
        serde_json::to_writer(&mut encoded, record)?;
        encoded.push(b'\n');
    }
    writer.write_all(&encoded)?;
    Ok(())
}

/// Read records written by [`write_ndjson`]
pub fn read_ndjson<R: BufRead>(reader: R) -> Result<Vec<ListingRecord>> {
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        records.push(serde_json::from_str(&line)?);
    }
    Ok(records)
}

#[async_trait]
impl ListingSinkPort for NdjsonListingSink {
    async fn write_batch(&self, records: &[ListingRecord]) -> Result<()> {
        let mut writer = self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        write_ndjson(&mut *writer, records)
    }

    async fn flush(&self) -> Result<()> {
        let mut writer = self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        writer.flush()?;
        Ok(())
    }
}
