//! Google Sheets implementation of [`engine::Store`].
//!
//! Authenticates with a service account (inline JSON key or key file), finds
//! the spreadsheet by name through Drive, creates it (and shares it) when it
//! does not exist, and keeps transactions in one worksheet whose first row is
//! [`engine::HEADERS`].

pub use credentials::ServiceAccountKey;
pub use error::SheetsError;
pub use store::{SheetsConfig, SheetsStore};

mod auth;
mod credentials;
mod error;
mod store;
