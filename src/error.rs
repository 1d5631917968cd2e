use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use log::error;
use serde::Serialize;

/// Result alias used across the ledger.
pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Rejected request: blank content, bad difficulty, unsupported file, ...
    #[error("{0}")]
    Validation(String),

    /// Chain, block, content record or user does not exist.
    #[error("{0}")]
    NotFound(String),

    /// No caller identity was attached to the request.
    #[error("caller identity required (X-User-Id)")]
    Unauthenticated,

    /// A block already occupies this (chain, index) slot.
    #[error("block index {index} already taken in chain {chain_id}")]
    IndexTaken { chain_id: String, index: u64 },

    /// Time-boxed search gave up before finding a nonce.
    #[error("mining timed out after {attempts} attempts at difficulty {difficulty}")]
    MiningTimeout { attempts: u64, difficulty: u32 },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    timestamp: i64,
}

impl ResponseError for LedgerError {
    fn status_code(&self) -> StatusCode {
        match self {
            LedgerError::Validation(_) => StatusCode::BAD_REQUEST,
            LedgerError::NotFound(_) => StatusCode::NOT_FOUND,
            LedgerError::Unauthenticated => StatusCode::UNAUTHORIZED,
            LedgerError::IndexTaken { .. } => StatusCode::CONFLICT,
            LedgerError::MiningTimeout { .. } => StatusCode::SERVICE_UNAVAILABLE,
            LedgerError::Config(_) | LedgerError::Storage(_) | LedgerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("request failed: {self}");
        }
        HttpResponse::build(status).json(ErrorBody {
            success: false,
            error: self.to_string(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        })
    }
}

impl From<actix_web::error::BlockingError> for LedgerError {
    fn from(err: actix_web::error::BlockingError) -> Self {
        LedgerError::Internal(err.to_string())
    }
}
