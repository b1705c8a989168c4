//! In-process table used for local development and tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{Record, Row, Store, StoreError, identifiers_from_table, records_from_table};
use crate::HEADERS;

/// A [`Store`] keeping the whole table in memory.
///
/// Faults can be injected to exercise the degraded paths of the engine:
/// [`MemoryStore::fail_identifier_reads`], [`MemoryStore::fail_appends`] and
/// [`MemoryStore::unconfigured`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    table: RwLock<Vec<Row>>,
    unconfigured: bool,
    fail_identifier_reads: AtomicBool,
    fail_appends: AtomicBool,
    append_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that behaves as if no credentials were provided.
    pub fn unconfigured() -> Self {
        Self {
            unconfigured: true,
            ..Self::default()
        }
    }

    /// A store pre-filled with `rows` under the standard header, as if they had
    /// been typed into the sheet by hand.
    pub fn with_rows(rows: Vec<Row>) -> Self {
        let mut table = vec![header_row()];
        table.extend(rows);
        Self {
            table: RwLock::new(table),
            ..Self::default()
        }
    }

    pub fn fail_identifier_reads(&self, fail: bool) {
        self.fail_identifier_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    /// Number of `append_rows` calls that reached the table.
    pub fn append_calls(&self) -> usize {
        self.append_calls.load(Ordering::SeqCst)
    }

    /// Copy of the raw table, header included.
    pub async fn snapshot(&self) -> Vec<Row> {
        self.table.read().await.clone()
    }

    fn check_configured(&self) -> Result<(), StoreError> {
        if self.unconfigured {
            return Err(StoreError::NotConfigured(
                "in-memory store was created without configuration".to_string(),
            ));
        }
        Ok(())
    }
}

fn header_row() -> Row {
    HEADERS.iter().map(|h| Value::from(*h)).collect()
}

#[async_trait]
impl Store for MemoryStore {
    async fn open(&self) -> Result<(), StoreError> {
        self.check_configured()?;
        let mut table = self.table.write().await;
        if table.is_empty() {
            table.push(header_row());
            tracing::info!("created in-memory transactions table with headers");
        }
        Ok(())
    }

    async fn reconnect(&self) {
        tracing::debug!("in-memory store has no connection to reset");
    }

    async fn read_identifier_column(&self) -> Result<Vec<String>, StoreError> {
        self.check_configured()?;
        if self.fail_identifier_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Backend(
                "identifier column read failed (injected)".into(),
            ));
        }
        Ok(identifiers_from_table(&self.table.read().await))
    }

    async fn read_all_rows(&self) -> Result<Vec<Record>, StoreError> {
        self.check_configured()?;
        Ok(records_from_table(&self.table.read().await))
    }

    async fn append_rows(&self, rows: Vec<Row>) -> Result<usize, StoreError> {
        self.check_configured()?;
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("append failed (injected)".into()));
        }
        let mut table = self.table.write().await;
        if table.is_empty() {
            table.push(header_row());
        }
        let written = rows.len();
        table.extend(rows);
        self.append_calls.fetch_add(1, Ordering::SeqCst);
        Ok(written)
    }
}
