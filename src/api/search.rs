use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use datasearch_backend::search::{SearchHit, SearchQuery, MAX_RESULTS};

use crate::api::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub term: String,
    #[serde(default)]
    pub column_filter: Option<String>,
    /// Capped at 50 / 最多50条
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
    pub total: usize,
    /// Tier that answered, for diagnostics / 命中的搜索层级
    pub strategy: Option<&'static str>,
}

/// POST /api/search
pub async fn search(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> Json<ApiResponse<SearchResponse>> {
    let query = SearchQuery::new(&req.term, req.column_filter.as_deref())
        .with_limit(req.limit.unwrap_or(MAX_RESULTS));

    match state.search.run(&query).await {
        Ok(results) => Json(ApiResponse::success(SearchResponse {
            total: results.hits.len(),
            results: results.hits,
            strategy: results.strategy,
        })),
        Err(e) => {
            // a failed search must not look like "no results"
            tracing::error!("Search '{}' failed: {}", query.term, e);
            Json(ApiResponse {
                code: 500,
                message: "search error".to_string(),
                data: None,
            })
        }
    }
}

/// GET /api/search/columns - 可用于筛选的列
pub async fn list_columns(State(state): State<Arc<AppState>>) -> Json<ApiResponse<Vec<String>>> {
    match state.store.column_names().await {
        Ok(columns) => Json(ApiResponse::success(columns)),
        Err(e) => Json(ApiResponse::from_error(&e)),
    }
}
