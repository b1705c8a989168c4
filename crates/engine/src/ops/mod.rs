use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{EngineError, ResultEngine, store::Store};

mod query;
mod sync;

pub use query::{DateRange, Summary};
pub use sync::{DedupMode, MAX_SYNC_BATCH, SyncOutcome};

/// Reconciliation and query entry point over one remote table.
///
/// The engine owns exactly one store, so the sync gate is effectively keyed by
/// the remote resource.
pub struct Engine {
    store: Arc<dyn Store>,
    sync_gate: Mutex<()>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Drop the store's cached handle; the next request opens it again.
    pub async fn reconnect(&self) {
        self.store.reconnect().await;
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine").finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct EngineBuilder {
    store: Option<Arc<dyn Store>>,
}

impl EngineBuilder {
    /// Pass the required remote store
    pub fn store(mut self, store: Arc<dyn Store>) -> EngineBuilder {
        self.store = Some(store);
        self
    }

    /// Construct `Engine`
    ///
    /// The store is not opened here: it is opened lazily by the first request
    /// so the service can start before credentials are in place.
    pub fn build(self) -> ResultEngine<Engine> {
        let store = self.store.ok_or_else(|| {
            EngineError::NotConfigured("no remote store given to the engine".to_string())
        })?;

        Ok(Engine {
            store,
            sync_gate: Mutex::new(()),
        })
    }
}
