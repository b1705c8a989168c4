use serde::{Deserialize, Serialize};

pub mod sync {
    use super::*;

    /// A transaction as recorded by the PWA.
    ///
    /// `type` and `paymentMethod` are kept as plain strings so the server can
    /// report exactly which field of which item is invalid.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionIn {
        pub id: String,
        #[serde(rename = "type")]
        pub kind: String,
        pub amount: f64,
        pub date: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub description: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub category: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub payment_method: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub user: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub created_at: Option<String>,
    }

    /// Batch of pending transactions (1..=100 items).
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SyncRequest {
        pub transactions: Vec<TransactionIn>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SyncResponse {
        pub synced: usize,
        pub message: String,
    }
}

pub mod transaction {
    use super::*;

    /// Optional inclusive `YYYY-MM-DD` bounds, sent as query parameters.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct DateRangeQuery {
        pub start_date: Option<String>,
        pub end_date: Option<String>,
    }

    /// A row read back from the spreadsheet.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionView {
        pub id: String,
        #[serde(rename = "type")]
        pub kind: String,
        pub amount: f64,
        pub date: String,
        pub description: String,
        pub category: String,
        pub payment_method: String,
        pub user: String,
        pub created_at: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub transactions: Vec<TransactionView>,
        pub total: usize,
    }
}

pub mod stats {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Summary {
        pub total_income: f64,
        pub total_expense: f64,
        pub balance: f64,
        pub count: usize,
    }
}

pub mod health {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Health {
        pub status: String,
        pub service: String,
        pub version: String,
    }
}

pub mod error {
    use super::*;

    /// One violated constraint, `field` is a path such as `transactions[2].amount`.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct FieldError {
        pub field: String,
        pub message: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ErrorResponse {
        pub error: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        pub fields: Vec<FieldError>,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_in_uses_camel_case_and_type_key() {
        let json = r#"{
            "id": "a",
            "type": "income",
            "amount": 100.0,
            "date": "2024-01-05",
            "paymentMethod": "card",
            "createdAt": "2024-01-05T10:00:00Z"
        }"#;
        let tx: sync::TransactionIn = serde_json::from_str(json).unwrap();
        assert_eq!(tx.kind, "income");
        assert_eq!(tx.payment_method.as_deref(), Some("card"));
        assert_eq!(tx.created_at.as_deref(), Some("2024-01-05T10:00:00Z"));
        assert_eq!(tx.category, None);
    }

    #[test]
    fn summary_serializes_camel_case() {
        let summary = stats::Summary {
            total_income: 100.0,
            total_expense: 40.0,
            balance: 60.0,
            count: 2,
        };
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["totalIncome"], 100.0);
        assert_eq!(value["totalExpense"], 40.0);
        assert_eq!(value["count"], 2);
    }
}
