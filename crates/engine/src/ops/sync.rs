//! Reconciliation: dedup a client batch against the remote ids, append the rest.

use std::collections::HashSet;

use chrono::Utc;

use crate::{EngineError, NewTransaction, ResultEngine, store::StoreError};

use super::Engine;

/// Upper bound on the number of transactions accepted by a single sync call.
pub const MAX_SYNC_BATCH: usize = 100;

/// How the batch was checked against already persisted ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DedupMode {
    /// The identifier column was read and every known id was skipped.
    Verified,
    /// The identifier column could not be read; the batch was appended as if
    /// the table held no ids, so rows may be duplicated.
    AvailableWithoutDedupGuarantee,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Rows the store reported as appended.
    pub synced: usize,
    /// Transactions dropped because their id was already persisted.
    pub skipped: usize,
    pub dedup: DedupMode,
}

impl Engine {
    /// Persist the transactions of `batch` whose id is not in the remote table.
    ///
    /// Ids already present are dropped silently. Ids repeated inside `batch`
    /// itself are not collapsed: each occurrence is appended.
    ///
    /// The read of the identifier column and the append run under the sync
    /// gate, so concurrent calls on the same engine cannot both append the same
    /// new id. Writers outside this process are not covered.
    pub async fn sync(&self, batch: Vec<NewTransaction>) -> ResultEngine<SyncOutcome> {
        if batch.is_empty() {
            return Ok(SyncOutcome {
                synced: 0,
                skipped: 0,
                dedup: DedupMode::Verified,
            });
        }
        if batch.len() > MAX_SYNC_BATCH {
            return Err(EngineError::InvalidBatch(format!(
                "{} transactions sent, at most {MAX_SYNC_BATCH} allowed per sync",
                batch.len()
            )));
        }

        let _gate = self.sync_gate.lock().await;

        self.store.open().await.map_err(EngineError::open)?;
        let (known, dedup) = self.known_identifiers().await?;

        warn_repeated_ids(&batch);

        let total = batch.len();
        let kept: Vec<NewTransaction> = batch
            .into_iter()
            .filter(|tx| !known.contains(&tx.id))
            .collect();
        let skipped = total - kept.len();

        if kept.is_empty() {
            tracing::debug!("all {total} transaction(s) already synced, nothing to append");
            return Ok(SyncOutcome {
                synced: 0,
                skipped,
                dedup,
            });
        }

        let now = Utc::now();
        let rows = kept.iter().map(|tx| tx.to_row(now)).collect();
        let synced = self
            .store
            .append_rows(rows)
            .await
            .map_err(EngineError::write)?;

        tracing::info!("appended {synced} row(s), skipped {skipped} already synced");
        Ok(SyncOutcome {
            synced,
            skipped,
            dedup,
        })
    }

    async fn known_identifiers(&self) -> ResultEngine<(HashSet<String>, DedupMode)> {
        match self.store.read_identifier_column().await {
            Ok(ids) => Ok((ids.into_iter().collect(), DedupMode::Verified)),
            Err(StoreError::NotConfigured(msg)) => Err(EngineError::NotConfigured(msg)),
            Err(err) => {
                tracing::warn!(
                    "could not read existing ids, syncing without duplicate check: {err}"
                );
                Ok((HashSet::new(), DedupMode::AvailableWithoutDedupGuarantee))
            }
        }
    }
}

fn warn_repeated_ids(batch: &[NewTransaction]) {
    let mut seen = HashSet::with_capacity(batch.len());
    let repeated: Vec<&str> = batch
        .iter()
        .filter(|tx| !seen.insert(tx.id.as_str()))
        .map(|tx| tx.id.as_str())
        .collect();
    if !repeated.is_empty() {
        tracing::warn!(
            "batch repeats id(s) {repeated:?}; repeats inside a batch are not collapsed"
        );
    }
}
