//! Transactions API endpoints

use api_types::transaction::{DateRangeQuery, TransactionListResponse, TransactionView};
use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};

use crate::{ServerError, server::ServerState, validation};

fn map_transaction(tx: engine::StoredTransaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        kind: tx.kind,
        amount: tx.amount,
        date: tx.date,
        description: tx.description,
        category: tx.category,
        payment_method: tx.payment_method,
        user: tx.user,
        created_at: tx.created_at,
    }
}

/// List stored transactions, optionally within `start_date..=end_date`.
pub async fn list(
    State(state): State<ServerState>,
    query: Result<Query<DateRangeQuery>, QueryRejection>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let Query(query) = query?;
    let range = validation::date_range(query)?;

    let transactions: Vec<TransactionView> = state
        .engine
        .list_transactions(&range)
        .await?
        .into_iter()
        .map(map_transaction)
        .collect();

    Ok(Json(TransactionListResponse {
        total: transactions.len(),
        transactions,
    }))
}
