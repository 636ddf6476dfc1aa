pub mod admin;
pub mod import;
pub mod records;
pub mod search;
pub mod server;

use serde::Serialize;

use datasearch_backend::error::{ErrorCode, RecordError};

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: 200,
            message: "success".to_string(),
            data: Some(data),
        }
    }

    pub fn success_with(message: impl Into<String>, data: T) -> Self {
        Self {
            code: 200,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn error(message: &str) -> Self {
        Self {
            code: 400,
            message: message.to_string(),
            data: None,
        }
    }

    /// Map a core error onto a response code without leaking storage details
    /// 核心错误转响应，不暴露存储细节
    pub fn from_error(err: &RecordError) -> Self {
        let (code, message) = match err.code() {
            ErrorCode::InvalidPayload => (400, err.to_string()),
            ErrorCode::NotFound => (404, err.to_string()),
            ErrorCode::PartialBatchFailure => (207, err.to_string()),
            ErrorCode::StorageUnavailable | ErrorCode::CorruptPayload => {
                tracing::error!("Request failed: {}", err);
                (500, "服务器错误 / internal error".to_string())
            }
        };
        Self {
            code,
            message,
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_errors_are_masked() {
        let resp = ApiResponse::<()>::from_error(&RecordError::StorageUnavailable(sqlx::Error::PoolClosed));
        assert_eq!(resp.code, 500);
        assert!(!resp.message.contains("pool"));
    }

    #[test]
    fn test_client_errors_keep_their_message() {
        let resp = ApiResponse::<()>::from_error(&RecordError::NotFound(3));
        assert_eq!(resp.code, 404);
        assert_eq!(resp.message, "record 3 not found");
    }
}
