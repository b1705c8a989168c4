//! Remote store abstraction.
//!
//! The remote store is an append-only table: the first row is the header
//! (see [`HEADERS`]) and every following row is one persisted transaction.
//! Adapters expose only reads of the whole table (or its first column) and a
//! single batched append.
//!
//!  [`HEADERS`]: crate::HEADERS

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use memory::MemoryStore;

mod memory;

/// A single spreadsheet cell, as exchanged with the backing store.
pub type Cell = Value;

/// A row of cells in header order.
pub type Row = Vec<Cell>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0}")]
    NotConfigured(String),
    #[error(transparent)]
    Backend(Box<dyn std::error::Error + Send + Sync>),
}

/// Row-level access to the single table holding all transactions.
#[async_trait]
pub trait Store: Send + Sync {
    /// Locate (or create) the resource and make sure the header row exists.
    ///
    /// Must be idempotent. Implementations cache the opened handle and reuse
    /// it until [`Store::reconnect`] is called.
    async fn open(&self) -> Result<(), StoreError>;

    /// Forget the cached handle so the next call opens the resource again.
    async fn reconnect(&self);

    /// Values of the first column, header excluded, in storage order.
    async fn read_identifier_column(&self) -> Result<Vec<String>, StoreError>;

    /// Every data row keyed by header name, in storage order.
    async fn read_all_rows(&self) -> Result<Vec<Record>, StoreError>;

    /// Append `rows` at the end of the table in one call and return how many
    /// rows were written.
    async fn append_rows(&self, rows: Vec<Row>) -> Result<usize, StoreError>;
}

/// A data row keyed by the header cell of its column.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    fields: HashMap<String, Cell>,
}

impl Record {
    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.fields.get(column)
    }

    /// Cell rendered as text; missing cells read as an empty string.
    pub fn text(&self, column: &str) -> String {
        self.get(column).map(cell_text).unwrap_or_default()
    }

    /// Cell read as a number; missing or malformed cells read as `0.0`.
    pub fn number(&self, column: &str) -> f64 {
        let value = match self.get(column) {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        value.filter(|v| v.is_finite()).unwrap_or(0.0)
    }
}

impl FromIterator<(String, Cell)> for Record {
    fn from_iter<T: IntoIterator<Item = (String, Cell)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Render a cell the way a spreadsheet would show it as plain text.
pub fn cell_text(cell: &Cell) -> String {
    match cell {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

/// Turn a raw table (header first) into field-named records.
///
/// Rows shorter than the header are padded with empty cells; cells beyond the
/// header are dropped.
pub fn records_from_table(table: &[Row]) -> Vec<Record> {
    let Some((header, rows)) = table.split_first() else {
        return Vec::new();
    };
    let header: Vec<String> = header.iter().map(cell_text).collect();

    rows.iter()
        .map(|row| {
            header
                .iter()
                .enumerate()
                .map(|(idx, name)| {
                    let cell = row.get(idx).cloned().unwrap_or_else(|| Value::from(""));
                    (name.clone(), cell)
                })
                .collect()
        })
        .collect()
}

/// First cell of every data row of a raw table (header first).
pub fn identifiers_from_table(table: &[Row]) -> Vec<String> {
    table
        .iter()
        .skip(1)
        .map(|row| row.first().map(cell_text).unwrap_or_default())
        .collect()
}
