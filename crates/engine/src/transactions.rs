//! Transaction primitives.
//!
//! A [`NewTransaction`] is what a client submits for sync; a
//! [`StoredTransaction`] is a row read back from the remote table. The two
//! differ on purpose: rows may have been edited by hand, so the read side keeps
//! `type` and payment method as raw text.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::store::{Record, Row};

/// Header row of the transactions table, in column order.
pub const HEADERS: [&str; 9] = [
    "ID",
    "Type",
    "Amount",
    "Date",
    "Description",
    "Category",
    "Payment Method",
    "User",
    "Created",
];

pub(crate) mod column {
    pub const ID: &str = "ID";
    pub const TYPE: &str = "Type";
    pub const AMOUNT: &str = "Amount";
    pub const DATE: &str = "Date";
    pub const DESCRIPTION: &str = "Description";
    pub const CATEGORY: &str = "Category";
    pub const PAYMENT_METHOD: &str = "Payment Method";
    pub const USER: &str = "User";
    pub const CREATED: &str = "Created";
}

pub const DEFAULT_CATEGORY: &str = "general";
pub const DEFAULT_USER: &str = "User";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("expected one of {expected}, got `{value}`")]
pub struct UnknownVariant {
    pub value: String,
    pub expected: &'static str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl FromStr for TransactionKind {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(UnknownVariant {
                value: other.to_string(),
                expected: "income, expense",
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Transfer,
    Card,
    Check,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Transfer => "transfer",
            Self::Card => "card",
            Self::Check => "check",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "cash" => Ok(Self::Cash),
            "transfer" => Ok(Self::Transfer),
            "card" => Ok(Self::Card),
            "check" => Ok(Self::Check),
            other => Err(UnknownVariant {
                value: other.to_string(),
                expected: "cash, transfer, card, check",
            }),
        }
    }
}

/// A validated transaction waiting to be synced.
#[derive(Clone, Debug, PartialEq)]
pub struct NewTransaction {
    pub id: String,
    pub kind: TransactionKind,
    pub amount: f64,
    pub date: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub user: Option<String>,
    pub created_at: Option<String>,
}

impl NewTransaction {
    pub fn new(
        id: impl Into<String>,
        kind: TransactionKind,
        amount: f64,
        date: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            amount,
            date: date.into(),
            description: None,
            category: None,
            payment_method: None,
            user: None,
            created_at: None,
        }
    }

    /// Build the fixed-column row for this transaction, filling defaults.
    ///
    /// `now` is used as the creation timestamp when the client did not send
    /// one.
    pub fn to_row(&self, now: DateTime<Utc>) -> Row {
        let created_at = self
            .created_at
            .clone()
            .unwrap_or_else(|| now.to_rfc3339_opts(SecondsFormat::Millis, true));

        vec![
            Value::from(self.id.as_str()),
            Value::from(self.kind.as_str()),
            Value::from(self.amount),
            Value::from(self.date.as_str()),
            Value::from(self.description.clone().unwrap_or_default()),
            Value::from(non_blank_or(&self.category, DEFAULT_CATEGORY)),
            Value::from(self.payment_method.unwrap_or_default().as_str()),
            Value::from(non_blank_or(&self.user, DEFAULT_USER)),
            Value::from(created_at),
        ]
    }
}

fn non_blank_or(value: &Option<String>, default: &str) -> String {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(default)
        .to_string()
}

/// A transaction row as read back from the remote table.
#[derive(Clone, Debug, PartialEq)]
pub struct StoredTransaction {
    pub id: String,
    pub kind: String,
    pub amount: f64,
    pub date: String,
    pub description: String,
    pub category: String,
    pub payment_method: String,
    pub user: String,
    pub created_at: String,
}

impl StoredTransaction {
    /// Only an exact (case-insensitive, untrimmed) `income` counts as income;
    /// every other type value is treated as an expense.
    pub fn is_income(&self) -> bool {
        self.kind.eq_ignore_ascii_case(TransactionKind::Income.as_str())
    }
}

impl From<&Record> for StoredTransaction {
    fn from(record: &Record) -> Self {
        let payment_method = record.text(column::PAYMENT_METHOD);
        Self {
            id: record.text(column::ID),
            kind: record.text(column::TYPE),
            amount: record.number(column::AMOUNT),
            date: record.text(column::DATE),
            description: record.text(column::DESCRIPTION),
            category: record.text(column::CATEGORY),
            payment_method: if payment_method.is_empty() {
                PaymentMethod::Cash.as_str().to_string()
            } else {
                payment_method
            },
            user: record.text(column::USER),
            created_at: record.text(column::CREATED),
        }
    }
}
