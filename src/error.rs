//! Record error taxonomy / 记录错误类型
//!
//! Every core operation returns `Result<T, RecordError>`; raw sqlx errors never
//! leave the library without being wrapped here.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Per-row failure collected by bulk insert / 批量插入的单行错误
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    /// Zero-based row index in the submitted batch / 行号（从0开始）
    pub row: usize,
    pub code: ErrorCode,
    pub message: String,
}

/// Core error / 核心错误
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("record {0} not found")]
    NotFound(i64),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] sqlx::Error),

    #[error("stored payload is corrupt: {0}")]
    CorruptPayload(#[from] serde_json::Error),

    #[error("{inserted} rows inserted, {} rows rejected", .errors.len())]
    PartialBatchFailure { inserted: usize, errors: Vec<RowError> },
}

/// Serializable error kind for API bodies / 可序列化的错误码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidPayload,
    NotFound,
    StorageUnavailable,
    CorruptPayload,
    PartialBatchFailure,
}

impl RecordError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        RecordError::InvalidPayload(reason.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            RecordError::InvalidPayload(_) => ErrorCode::InvalidPayload,
            RecordError::NotFound(_) => ErrorCode::NotFound,
            RecordError::StorageUnavailable(_) => ErrorCode::StorageUnavailable,
            RecordError::CorruptPayload(_) => ErrorCode::CorruptPayload,
            RecordError::PartialBatchFailure { .. } => ErrorCode::PartialBatchFailure,
        }
    }

    /// Database-level rejection (bad FTS syntax, missing virtual table), as
    /// opposed to a pool/connection failure.
    pub fn is_query_rejected(&self) -> bool {
        matches!(self, RecordError::StorageUnavailable(sqlx::Error::Database(_)))
    }
}
