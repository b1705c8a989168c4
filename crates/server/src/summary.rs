//! Summary API endpoint

use api_types::{stats::Summary, transaction::DateRangeQuery};
use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};

use crate::{ServerError, server::ServerState, validation};

/// Handle requests for income/expense totals over a date range
pub async fn get(
    State(state): State<ServerState>,
    query: Result<Query<DateRangeQuery>, QueryRejection>,
) -> Result<Json<Summary>, ServerError> {
    let Query(query) = query?;
    let range = validation::date_range(query)?;

    let summary = state.engine.summarize(&range).await?;

    Ok(Json(Summary {
        total_income: summary.total_income,
        total_expense: summary.total_expense,
        balance: summary.balance,
        count: summary.count,
    }))
}
