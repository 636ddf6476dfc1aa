use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use datasearch_backend::error::RecordError;
use datasearch_backend::models::{Payload, Record, RecordPage};
use datasearch_backend::mutation::SaveOutcome;
use datasearch_backend::search::schema::detail_url;

use crate::api::admin::{require_admin, AdminRejection};
use crate::api::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct RecordDetail {
    #[serde(flatten)]
    pub record: Record,
    pub detail_url: String,
}

/// GET /api/records/:id - 记录详情
pub async fn get_record(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Json<ApiResponse<RecordDetail>> {
    match state.store.get(id).await {
        Ok(record) => Json(ApiResponse::success(RecordDetail {
            detail_url: detail_url(&state.config.search.detail_url_base, record.id),
            record,
        })),
        Err(e) => Json(ApiResponse::from_error(&e)),
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 { 1 }
fn default_per_page() -> u32 { 20 }

/// GET /api/admin/records
pub async fn list_records(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<RecordPage>>, AdminRejection> {
    require_admin(&state, &headers)?;

    Ok(Json(match state.store.list(query.page, query.per_page).await {
        Ok(page) => ApiResponse::success(page),
        Err(e) => ApiResponse::from_error(&e),
    }))
}

#[derive(Debug, Deserialize)]
pub struct SaveRecordRequest {
    #[serde(default)]
    pub record_id: Option<i64>,
    /// Scalar cells; numbers and booleans are kept as text / 字段
    pub fields: Value,
}

/// Flatten submitted fields the way imported rows are / 提交字段转键值对
fn submitted_fields(fields: Value) -> Result<Vec<(String, String)>, RecordError> {
    let payload = Payload::from_json(fields)?;
    Ok(payload.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
}

/// POST /api/admin/records - 新增或更新记录
pub async fn save_record(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<SaveRecordRequest>,
) -> Result<Json<ApiResponse<SaveOutcome>>, AdminRejection> {
    require_admin(&state, &headers)?;

    let fields = match submitted_fields(req.fields) {
        Ok(fields) => fields,
        Err(e) => return Ok(Json(ApiResponse::from_error(&e))),
    };

    Ok(Json(match state.mutation.save(req.record_id, fields).await {
        Ok(outcome) => ApiResponse::success_with(outcome.message(), outcome),
        Err(e) => ApiResponse::from_error(&e),
    }))
}

#[derive(Debug, Deserialize)]
pub struct SetFieldRequest {
    pub column: String,
    #[serde(default)]
    pub value: String,
}

/// POST /api/admin/records/:id/field - 修改单个字段
pub async fn set_field(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<SetFieldRequest>,
) -> Result<Json<ApiResponse<Payload>>, AdminRejection> {
    require_admin(&state, &headers)?;

    Ok(Json(match state.mutation.set_field(id, &req.column, &req.value).await {
        Ok(payload) => ApiResponse::success(payload),
        Err(e) => ApiResponse::from_error(&e),
    }))
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

/// POST /api/admin/records/:id/delete
pub async fn delete_record(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<DeleteResponse>>, AdminRejection> {
    require_admin(&state, &headers)?;

    Ok(Json(match state.mutation.delete(id).await {
        Ok(true) => ApiResponse::success_with("Record deleted successfully", DeleteResponse { deleted: true }),
        Ok(false) => ApiResponse::success_with("Record not found", DeleteResponse { deleted: false }),
        Err(e) => ApiResponse::from_error(&e),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_submitted_fields_stringify_scalars() {
        let fields = submitted_fields(json!({"qty": 3, "active": true, "name": "Acme"})).unwrap();
        assert_eq!(
            fields,
            vec![
                ("qty".to_string(), "3".to_string()),
                ("active".to_string(), "true".to_string()),
                ("name".to_string(), "Acme".to_string()),
            ]
        );
    }

    #[test]
    fn test_submitted_fields_reject_nested_values() {
        let err = submitted_fields(json!({"tags": ["a", "b"]})).unwrap_err();
        assert!(matches!(err, RecordError::InvalidPayload(_)));
        assert_eq!(ApiResponse::<()>::from_error(&err).code, 400);

        let err = submitted_fields(json!("not an object")).unwrap_err();
        assert!(matches!(err, RecordError::InvalidPayload(_)));
    }
}
