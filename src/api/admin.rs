use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use datasearch_backend::export::ExportTable;
use datasearch_backend::models::Statistics;

use crate::api::ApiResponse;
use crate::state::AppState;

pub type AdminRejection = (StatusCode, Json<Value>);

/// 验证管理员权限
///
/// With an empty `admin.api_token` every request passes.
pub fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), AdminRejection> {
    let expected = state.config.admin.api_token.as_str();
    if expected.is_empty() {
        return Ok(());
    }

    let token = bearer_token(headers)
        .ok_or_else(|| (StatusCode::UNAUTHORIZED, Json(json!({"error": "未登录"}))))?;

    if token != expected {
        return Err((StatusCode::FORBIDDEN, Json(json!({"error": "需要管理员权限"}))));
    }
    Ok(())
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

/// GET /api/admin/stats
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<Statistics>>, AdminRejection> {
    require_admin(&state, &headers)?;

    Ok(Json(match state.store.statistics().await {
        Ok(stats) => ApiResponse::success(stats),
        Err(e) => ApiResponse::from_error(&e),
    }))
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub deleted: u64,
}

/// POST /api/admin/clear - 清空所有记录
pub async fn clear_records(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<ClearResponse>>, AdminRejection> {
    require_admin(&state, &headers)?;

    Ok(Json(match state.store.clear_all().await {
        Ok(deleted) => ApiResponse::success_with("All records cleared successfully", ClearResponse { deleted }),
        Err(e) => ApiResponse::from_error(&e),
    }))
}

/// GET /api/admin/export - 导出全部记录
pub async fn export_records(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<ExportTable>>, AdminRejection> {
    require_admin(&state, &headers)?;

    Ok(Json(match state.store.all_records().await {
        Ok(records) => {
            let table = ExportTable::from_records(&records);
            let message = if table.is_empty() { "No records to export" } else { "success" };
            ApiResponse::success_with(message, table)
        }
        Err(e) => ApiResponse::from_error(&e),
    }))
}
