pub mod csv_source;
pub mod memory_sink;
pub mod ndjson_sink;
pub mod sqlite_sink;

use std::sync::Arc;

use crate::app::ports::ListingSinkPort;
use crate::config::{SinkConfig, SinkKind};
use crate::error::Result;

/// Build the sink named by the configuration
pub fn sink_from_config(config: &SinkConfig) -> Result<Arc<dyn ListingSinkPort>> {
    let sink: Arc<dyn ListingSinkPort> = match config.kind {
        SinkKind::Sqlite => Arc::new(sqlite_sink::SqliteListingSink::open(&config.path, &config.table)?),
        SinkKind::Ndjson => Arc::new(ndjson_sink::NdjsonListingSink::open(&config.path)?),
    };
    Ok(sink)
}
