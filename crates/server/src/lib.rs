use api_types::error::{ErrorResponse, FieldError};
use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::IntoResponse,
};
use engine::EngineError;

pub use server::{CorsSettings, cors_layer, router, run_with_listener};

mod health;
mod server;
mod summary;
mod sync;
mod transactions;
mod validation;

pub mod types {
    pub mod sync {
        pub use api_types::sync::{SyncRequest, SyncResponse, TransactionIn};
    }

    pub mod transaction {
        pub use api_types::transaction::{
            DateRangeQuery, TransactionListResponse, TransactionView,
        };
    }

    pub mod stats {
        pub use api_types::stats::Summary;
    }
}

#[derive(Debug)]
pub enum ServerError {
    Engine(EngineError),
    /// Request fields that failed validation; never reaches the engine.
    Validation(Vec<FieldError>),
    /// Body or query string that could not be decoded at all.
    Rejected { status: StatusCode, message: String },
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
        EngineError::InvalidBatch(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::Open(_) | EngineError::Read(_) | EngineError::Write(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Open(_) | EngineError::Read(_) | EngineError::Write(_) => {
            tracing::error!("remote store error: {err}");
            "internal server error".to_string()
        }
        EngineError::NotConfigured(_) => {
            tracing::error!("{err}");
            err.to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            ServerError::Engine(err) => (
                status_for_engine_error(&err),
                ErrorResponse {
                    error: message_for_engine_error(err),
                    fields: Vec::new(),
                },
            ),
            ServerError::Validation(fields) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorResponse {
                    error: "validation failed".to_string(),
                    fields,
                },
            ),
            ServerError::Rejected { status, message } => (
                status,
                ErrorResponse {
                    error: message,
                    fields: Vec::new(),
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<JsonRejection> for ServerError {
    fn from(value: JsonRejection) -> Self {
        Self::Rejected {
            status: value.status(),
            message: value.body_text(),
        }
    }
}

impl From<QueryRejection> for ServerError {
    fn from(value: QueryRejection) -> Self {
        Self::Rejected {
            status: value.status(),
            message: value.body_text(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::StoreError;

    #[test]
    fn not_configured_maps_to_503() {
        let res = ServerError::from(EngineError::NotConfigured("no key".to_string()))
            .into_response();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn write_failure_maps_to_500() {
        let err = EngineError::Write(StoreError::Backend("boom".into()));
        let res = ServerError::from(err).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn read_failure_maps_to_500() {
        let err = EngineError::Read(StoreError::Backend("bad".into()));
        let res = ServerError::from(err).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn invalid_batch_maps_to_422() {
        let res = ServerError::from(EngineError::InvalidBatch("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn validation_maps_to_422() {
        let res = ServerError::Validation(vec![FieldError {
            field: "transactions[0].amount".to_string(),
            message: "must be a positive number".to_string(),
        }])
        .into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn rejection_keeps_its_status() {
        let res = ServerError::Rejected {
            status: StatusCode::BAD_REQUEST,
            message: "bad".to_string(),
        }
        .into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
