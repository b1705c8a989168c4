use crate::{EngineError, ResultEngine, StoredTransaction};

use super::Engine;

/// Inclusive `YYYY-MM-DD` bounds, compared as strings.
///
/// Filtering applies only when both bounds are known; a range built from a
/// single bound matches every row. Lexicographic order matches calendar order
/// only because dates are zero-padded and fixed-width.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DateRange {
    bounds: Option<(String, String)>,
}

impl DateRange {
    /// `start..=end` when both are given, otherwise the unbounded range.
    pub fn new(start: Option<String>, end: Option<String>) -> Self {
        Self {
            bounds: start.zip(end),
        }
    }

    /// The unbounded range.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn between(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            bounds: Some((start.into(), end.into())),
        }
    }

    pub fn is_bounded(&self) -> bool {
        self.bounds.is_some()
    }

    pub fn contains(&self, date: &str) -> bool {
        self.bounds
            .as_ref()
            .is_none_or(|(start, end)| start.as_str() <= date && date <= end.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Summary {
    pub total_income: f64,
    pub total_expense: f64,
    pub balance: f64,
    pub count: usize,
}

impl Summary {
    /// Fold `transactions` into totals. Anything that is not `income` is
    /// counted as expense, unknown types included.
    pub fn from_transactions(transactions: &[StoredTransaction]) -> Self {
        let (total_income, total_expense) =
            transactions
                .iter()
                .fold((0.0, 0.0), |(income, expense), tx| {
                    if tx.is_income() {
                        (income + tx.amount, expense)
                    } else {
                        (income, expense + tx.amount)
                    }
                });

        Self {
            total_income,
            total_expense,
            balance: total_income - total_expense,
            count: transactions.len(),
        }
    }
}

impl Engine {
    /// Rows of the remote table whose date falls in `range`, in storage
    /// (append) order.
    pub async fn list_transactions(
        &self,
        range: &DateRange,
    ) -> ResultEngine<Vec<StoredTransaction>> {
        self.store.open().await.map_err(EngineError::open)?;
        let records = self
            .store
            .read_all_rows()
            .await
            .map_err(EngineError::read)?;

        Ok(records
            .iter()
            .map(StoredTransaction::from)
            .filter(|tx| range.contains(&tx.date))
            .collect())
    }

    pub async fn summarize(&self, range: &DateRange) -> ResultEngine<Summary> {
        let transactions = self.list_transactions(range).await?;
        Ok(Summary::from_transactions(&transactions))
    }
}
