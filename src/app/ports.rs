use async_trait::async_trait;

use crate::domain::ListingRecord;
use crate::error::Result;

/// One line of a source export, tagged with the file it came from
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawLine {
    pub text: String,
    pub source_tag: Option<String>,
}

impl RawLine {
    pub fn new(text: impl Into<String>, source_tag: Option<&str>) -> Self {
        Self {
            text: text.into(),
            source_tag: source_tag.map(str::to_string),
        }
    }
}

// Source-side port
#[async_trait]
pub trait LineSourcePort: Send + Sync {
    /// Inputs the source will read, in read order
    async fn list_inputs(&self) -> Result<Vec<String>>;

    /// Open one input for batched reading
    async fn open_input(&self, input: &str) -> Result<Box<dyn LineBatchReader>>;
}

/// Pulls data lines from one open input, headers already skipped
#[async_trait]
pub trait LineBatchReader: Send {
    /// Up to `max` lines; an empty batch means the input is exhausted.
    async fn next_batch(&mut self, max: usize) -> Result<Vec<RawLine>>;
}

// Sink-side port
#[async_trait]
pub trait ListingSinkPort: Send + Sync {
    /// Append valued records. Existing rows are never modified.
    async fn write_batch(&self, records: &[ListingRecord]) -> Result<()>;

    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}
