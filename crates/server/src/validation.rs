//! Request validation.
//!
//! Every violated constraint is reported with the path of the offending field
//! so the PWA can tell the user what to fix.

use api_types::{
    error::FieldError,
    sync::{SyncRequest, TransactionIn},
    transaction::DateRangeQuery,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use engine::{DateRange, MAX_SYNC_BATCH, NewTransaction, PaymentMethod, TransactionKind};

use crate::ServerError;

/// `YYYY-MM-DD`, zero padded, and an existing calendar day.
pub(crate) fn is_iso_date(value: &str) -> bool {
    value.len() == 10
        && value.bytes().enumerate().all(|(idx, b)| match idx {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        })
        && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

/// RFC 3339, or an ISO date-time without offset.
fn is_iso_timestamp(value: &str) -> bool {
    DateTime::parse_from_rfc3339(value).is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
}

fn field_error(field: impl Into<String>, message: impl Into<String>) -> FieldError {
    FieldError {
        field: field.into(),
        message: message.into(),
    }
}

fn transaction(
    idx: usize,
    tx: TransactionIn,
    errors: &mut Vec<FieldError>,
) -> Option<NewTransaction> {
    let prefix = format!("transactions[{idx}]");
    let before = errors.len();

    if tx.id.trim().is_empty() {
        errors.push(field_error(format!("{prefix}.id"), "must not be empty"));
    }

    let kind = tx
        .kind
        .parse::<TransactionKind>()
        .map_err(|err| errors.push(field_error(format!("{prefix}.type"), err.to_string())))
        .ok();

    if !(tx.amount.is_finite() && tx.amount > 0.0) {
        errors.push(field_error(
            format!("{prefix}.amount"),
            "must be a number greater than 0",
        ));
    }

    if !is_iso_date(&tx.date) {
        errors.push(field_error(
            format!("{prefix}.date"),
            "must be a calendar date formatted as YYYY-MM-DD",
        ));
    }

    let payment_method = match tx.payment_method.as_deref() {
        None => None,
        Some(raw) => match raw.parse::<PaymentMethod>() {
            Ok(method) => Some(method),
            Err(err) => {
                errors.push(field_error(
                    format!("{prefix}.paymentMethod"),
                    err.to_string(),
                ));
                None
            }
        },
    };

    let created_at = tx.created_at.filter(|value| !value.trim().is_empty());
    if let Some(value) = created_at.as_deref()
        && !is_iso_timestamp(value)
    {
        errors.push(field_error(
            format!("{prefix}.createdAt"),
            "must be an ISO 8601 timestamp",
        ));
    }

    if errors.len() != before {
        return None;
    }

    Some(NewTransaction {
        id: tx.id,
        kind: kind?,
        amount: tx.amount,
        date: tx.date,
        description: tx.description,
        category: tx.category,
        payment_method,
        user: tx.user,
        created_at,
    })
}

/// Check a sync request and turn it into the engine's batch.
pub(crate) fn sync_batch(request: SyncRequest) -> Result<Vec<NewTransaction>, ServerError> {
    let count = request.transactions.len();
    if count == 0 || count > MAX_SYNC_BATCH {
        return Err(ServerError::Validation(vec![field_error(
            "transactions",
            format!("must contain between 1 and {MAX_SYNC_BATCH} transactions, got {count}"),
        )]));
    }

    let mut errors = Vec::new();
    let batch: Vec<NewTransaction> = request
        .transactions
        .into_iter()
        .enumerate()
        .filter_map(|(idx, tx)| transaction(idx, tx, &mut errors))
        .collect();

    if !errors.is_empty() {
        return Err(ServerError::Validation(errors));
    }
    Ok(batch)
}

/// Turn optional query bounds into a [`DateRange`].
///
/// Empty values are ignored. Each bound sent is checked, but rows are only
/// filtered when both are present.
pub(crate) fn date_range(query: DateRangeQuery) -> Result<DateRange, ServerError> {
    let mut errors = Vec::new();
    let mut bound = |name: &str, value: Option<String>| {
        let value = value.filter(|v| !v.trim().is_empty())?;
        if is_iso_date(&value) {
            Some(value)
        } else {
            errors.push(field_error(name, "must be a calendar date formatted as YYYY-MM-DD"));
            None
        }
    };

    let start = bound("start_date", query.start_date);
    let end = bound("end_date", query.end_date);

    if !errors.is_empty() {
        return Err(ServerError::Validation(errors));
    }
    Ok(DateRange::new(start, end))
}
