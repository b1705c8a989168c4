//! Sync API endpoint

use api_types::sync::{SyncRequest, SyncResponse};
use axum::{Json, extract::State, extract::rejection::JsonRejection};
use engine::DedupMode;

use crate::{ServerError, server::ServerState, validation};

/// Receive pending transactions from the PWA and append the new ones.
///
/// Transactions whose id is already stored are skipped silently.
pub async fn sync(
    State(state): State<ServerState>,
    payload: Result<Json<SyncRequest>, JsonRejection>,
) -> Result<Json<SyncResponse>, ServerError> {
    let Json(payload) = payload?;
    let batch = validation::sync_batch(payload)?;

    let outcome = state.engine.sync(batch).await?;
    tracing::info!("Synced {} transaction(s)", outcome.synced);

    let mut message = format!("{} transaction(s) synced", outcome.synced);
    if outcome.dedup == DedupMode::AvailableWithoutDedupGuarantee {
        message.push_str(" (duplicate check unavailable)");
    }

    Ok(Json(SyncResponse {
        synced: outcome.synced,
        message,
    }))
}
