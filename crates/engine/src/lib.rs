//! Sync and query core.
//!
//! [`Engine::sync`] reconciles a client batch against the remote table so a
//! transaction id is persisted at most once when batches are retried.
//! [`Engine::list_transactions`] and [`Engine::summarize`] are read-only views
//! over the same table. The table itself sits behind the [`Store`] trait.

pub use error::EngineError;
pub use ops::{DateRange, DedupMode, Engine, EngineBuilder, MAX_SYNC_BATCH, Summary, SyncOutcome};
pub use store::{Cell, MemoryStore, Record, Row, Store, StoreError};
pub use transactions::{
    DEFAULT_CATEGORY, DEFAULT_USER, HEADERS, NewTransaction, PaymentMethod, StoredTransaction,
    TransactionKind, UnknownVariant,
};

mod error;
mod ops;
pub mod store;
mod transactions;

type ResultEngine<T> = Result<T, EngineError>;
