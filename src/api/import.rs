use axum::{extract::State, http::HeaderMap, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use datasearch_backend::error::RowError;
use datasearch_backend::ingest::{column_mapping, preview, validate_import, ColumnMapping, ImportValidation};

use crate::api::admin::{require_admin, AdminRejection};
use crate::api::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub rows: Vec<Value>,
    #[serde(default)]
    pub clear_existing: bool,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub inserted_count: usize,
    pub errors: Vec<RowError>,
    pub column_mapping: Vec<ColumnMapping>,
    pub preview: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub rows: Vec<Value>,
}

/// POST /api/admin/import/validate - 导入前校验
pub async fn validate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ValidateRequest>,
) -> Result<Json<ApiResponse<ImportValidation>>, AdminRejection> {
    require_admin(&state, &headers)?;
    Ok(Json(ApiResponse::success(validate_import(&req.rows))))
}

/// POST /api/admin/import - 批量导入
pub async fn import_rows(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ImportRequest>,
) -> Result<Json<ApiResponse<ImportResponse>>, AdminRejection> {
    require_admin(&state, &headers)?;

    if req.rows.is_empty() {
        return Ok(Json(ApiResponse::error("No data to import")));
    }

    if req.clear_existing {
        if let Err(e) = state.store.clear_all().await {
            return Ok(Json(ApiResponse::from_error(&e)));
        }
    }

    let mapping = column_mapping(&req.rows[0]);
    let preview_rows = preview(&req.rows);

    Ok(Json(match state.ingest.bulk_insert(req.rows).await {
        Ok(report) => {
            // 207 when some rows were rejected
            let code = if report.is_partial() { 207 } else { 200 };
            ApiResponse {
                code,
                message: report.message(),
                data: Some(ImportResponse {
                    inserted_count: report.inserted_count,
                    errors: report.errors,
                    column_mapping: mapping,
                    preview: preview_rows,
                }),
            }
        }
        Err(e) => ApiResponse::from_error(&e),
    }))
}
