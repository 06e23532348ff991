use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use crate::app::ports::ListingSinkPort;
use crate::constants::sqlite_table_name;
use crate::domain::{ListingRecord, LISTING_COLUMNS};
use crate::error::{PipelineError, Result};

/// Append-only SQLite table holding valued listings.
///
/// The table is created on open if it does not exist; rows are only ever
/// inserted, one transaction per batch.
pub struct SqliteListingSink {
    conn: Mutex<Connection>,
    table: String,
}

impl SqliteListingSink {
    pub fn open<P: AsRef<Path>>(db_path: P, table: &str) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        info!(path = %db_path.display(), table, "Opened SQLite listing sink");
        Self::with_connection(conn, table)
    }

    pub fn open_in_memory(table: &str) -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, table)
    }

    fn with_connection(conn: Connection, table: &str) -> Result<Self> {
        let table = sqlite_table_name(table);
        conn.execute_batch(&create_table_sql(&table))?;
        Ok(Self {
            conn: Mutex::new(conn),
            table,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn count(&self) -> Result<u64> {
        let conn = self.lock();
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM \"{}\"", self.table),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn create_table_sql(table: &str) -> String {
    let columns = LISTING_COLUMNS
        .iter()
        .map(|(name, column_type)| format!("    {} {}", name, column_type.sql_type()))
        .collect::<Vec<_>>()
        .join(",\n");
    format!("CREATE TABLE IF NOT EXISTS \"{}\" (\n{}\n);", table, columns)
}

fn insert_sql(table: &str) -> String {
    let names = LISTING_COLUMNS
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=LISTING_COLUMNS.len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");
    format!("INSERT INTO \"{}\" ({}) VALUES ({})", table, names, placeholders)
}

#[async_trait]
impl ListingSinkPort for SqliteListingSink {
    async fn write_batch(&self, records: &[ListingRecord]) -> Result<()> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(&insert_sql(&self.table))?;
            for record in records {
                let valuation = record
                    .valuation
                    .ok_or_else(|| PipelineError::MissingValuation(record.id.clone()))?;
                stmt.execute(params![
                    record.id,
                    record.name,
                    record.price,
                    record.room_type,
                    record.property_type.as_str(),
                    record.region,
                    record.dataset_source,
                    valuation.estimated_occupancy,
                    valuation.cap_rate,
                    valuation.estimated_annual_revenue,
                    valuation.estimated_property_value,
                ])?;
            }
        }
        tx.commit()?;

        debug!(rows = records.len(), table = %self.table, "Appended rows");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::estimate::estimate;
    use crate::pipeline::processing::normalize::normalize;

    #[tokio::test]
    async fn test_appends_across_batches() {
        let sink = SqliteListingSink::open_in_memory("airbnb_valuation.listings").unwrap();
        assert_eq!(sink.table(), "airbnb_valuation_listings");

        let first = vec![estimate(normalize("A1,Room,100", Some("a.csv")))];
        let second = vec![
            estimate(normalize("A1,Room,100", Some("a.csv"))),
            estimate(normalize("B2,Luxury Loft,300", Some("b.csv"))),
        ];
        sink.write_batch(&first).await.unwrap();
        sink.write_batch(&second).await.unwrap();

        assert_eq!(sink.count().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_columns_round_trip() {
        let sink = SqliteListingSink::open_in_memory("listings").unwrap();
        sink.write_batch(&[estimate(normalize("D1,Desert Dome,100", None))])
            .await
            .unwrap();

        let conn = sink.lock();
        let (property_type, cap_rate, value): (String, f64, f64) = conn
            .query_row(
                "SELECT property_type, cap_rate, estimated_property_value FROM listings",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!(property_type, "desert");
        assert_eq!(cap_rate, 0.045);
        assert!((value - 100.0 * 365.0 * 0.55 / 0.045).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_unvalued_record_rolls_back_batch() {
        let sink = SqliteListingSink::open_in_memory("listings").unwrap();
        let batch = vec![
            estimate(normalize("A1,Room,100", None)),
            normalize("A2,Room,100", None),
        ];

        let result = sink.write_batch(&batch).await;
        assert!(matches!(result, Err(PipelineError::MissingValuation(id)) if id == "A2"));
        assert_eq!(sink.count().unwrap(), 0);
    }

    #[test]
    fn test_reopen_keeps_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("warehouse.db");

        let runtime = tokio::runtime::Runtime::new().unwrap();
        {
            let sink = SqliteListingSink::open(&path, "listings").unwrap();
            runtime
                .block_on(sink.write_batch(&[estimate(normalize("A1,Room,100", None))]))
                .unwrap();
        }
        let reopened = SqliteListingSink::open(&path, "listings").unwrap();
        assert_eq!(reopened.count().unwrap(), 1);
    }
}
