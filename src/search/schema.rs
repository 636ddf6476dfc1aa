//! Search request / result types / 搜索请求与结果

use serde::{Deserialize, Serialize};

use crate::models::{Payload, Record};

/// Parsed search request / 搜索请求
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    /// Trimmed search term / 搜索词
    pub term: String,
    /// Restrict matching to one column / 限定列
    pub column: Option<String>,
    /// Maximum number of hits / 最大结果数
    pub limit: usize,
}

impl SearchQuery {
    pub fn new(term: &str, column: Option<&str>) -> Self {
        Self {
            term: term.trim().to_string(),
            column: column
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            limit: super::MAX_RESULTS,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.min(super::MAX_RESULTS);
        self
    }

    /// Term length in characters / 搜索词字符数
    pub fn term_chars(&self) -> usize {
        self.term.chars().count()
    }
}

/// One search hit / 搜索结果项
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: i64,
    pub payload: Payload,
    pub summary: String,
    pub detail_url: String,
}

impl SearchHit {
    pub fn from_record(record: Record, detail_url_base: &str) -> Self {
        Self {
            id: record.id,
            summary: record.payload.summary(),
            detail_url: detail_url(detail_url_base, record.id),
            payload: record.payload,
        }
    }
}

/// Hits plus the tier that produced them / 结果及命中的层级
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResults {
    pub hits: Vec<SearchHit>,
    /// None when no tier matched / 无匹配时为空
    pub strategy: Option<&'static str>,
}

/// Stable per-record link / 记录详情链接
pub fn detail_url(base: &str, id: i64) -> String {
    format!("{}/{}/", base.trim_end_matches('/'), id)
}
