use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::app::ports::{LineBatchReader, LineSourcePort, RawLine};
use crate::config::SourceConfig;
use crate::error::{PipelineError, Result};

/// Reads delimited-text exports matching a glob pattern as batches of raw lines.
///
/// Lines are not parsed here; a quoted field spanning several physical lines
/// reaches the normalizer as separate lines.
pub struct GlobLineSource {
    pattern: String,
    skip_header_lines: usize,
}

impl GlobLineSource {
    pub fn new(pattern: impl Into<String>, skip_header_lines: usize) -> Self {
        Self {
            pattern: pattern.into(),
            skip_header_lines,
        }
    }

    pub fn from_config(config: &SourceConfig) -> Self {
        Self::new(config.input_pattern.clone(), config.skip_header_lines)
    }

    /// Regular files matching the pattern, sorted by path
    pub fn resolve_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in glob::glob(&self.pattern)? {
            let path = entry?;
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();

        if files.is_empty() {
            return Err(PipelineError::NoInputFiles(self.pattern.clone()));
        }
        Ok(files)
    }
}

/// File name used as the provenance tag for every line of that file
fn source_tag(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
}

#[async_trait]
impl LineSourcePort for GlobLineSource {
    async fn list_inputs(&self) -> Result<Vec<String>> {
        let files = self.resolve_files()?;
        info!(pattern = %self.pattern, files = files.len(), "Resolved input files");
        Ok(files
            .iter()
            .map(|path| path.to_string_lossy().into_owned())
            .collect())
    }

    async fn open_input(&self, input: &str) -> Result<Box<dyn LineBatchReader>> {
        let path = Path::new(input);
        let file = File::open(path).await?;
        debug!(input, "Opened input file");

        Ok(Box::new(FileLineReader {
            input: input.to_string(),
            tag: source_tag(path),
            reader: BufReader::new(file),
            skip_header_lines: self.skip_header_lines,
            line_number: 0,
            buf: Vec::new(),
        }))
    }
}

/// Reads one file a batch at a time.
///
/// Lines are split on raw bytes so an encoding problem stays local to its
/// line: bytes that are not UTF-8 are replaced with U+FFFD and logged.
struct FileLineReader {
    input: String,
    tag: Option<String>,
    reader: BufReader<File>,
    skip_header_lines: usize,
    line_number: usize,
    buf: Vec<u8>,
}

impl FileLineReader {
    fn decode(&self, bytes: &[u8]) -> String {
        let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
        let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
        match std::str::from_utf8(bytes) {
            Ok(text) => text.to_string(),
            Err(e) => {
                warn!(
                    input = %self.input,
                    line = self.line_number,
                    error = %e,
                    "Line is not valid UTF-8; decoding lossily"
                );
                String::from_utf8_lossy(bytes).into_owned()
            }
        }
    }
}

#[async_trait]
impl LineBatchReader for FileLineReader {
    async fn next_batch(&mut self, max: usize) -> Result<Vec<RawLine>> {
        let mut batch = Vec::new();

        while batch.len() < max {
            self.buf.clear();
            if self.reader.read_until(b'\n', &mut self.buf).await? == 0 {
                break;
            }
            self.line_number += 1;
            if self.line_number <= self.skip_header_lines {
                continue;
            }

            let text = self.decode(&self.buf);
            if text.trim().is_empty() {
                continue;
            }
            batch.push(RawLine {
                text,
                source_tag: self.tag.clone(),
            });
        }

        Ok(batch)
    }
}
