//! Search tiers / 搜索层级
//!
//! Each tier answers `None` when it does not apply to the query, or the
//! records it matched. The engine stops at the first non-empty answer.

use async_trait::async_trait;

use super::query::build_fts_query;
use super::schema::SearchQuery;
use crate::error::RecordError;
use crate::models::Record;
use crate::store::RecordStore;

#[async_trait]
pub trait SearchStrategy: Send + Sync {
    /// Short name reported with results / 层级名称
    fn name(&self) -> &'static str;

    async fn attempt(&self, store: &RecordStore, query: &SearchQuery) -> Result<Option<Vec<Record>>, RecordError>;
}

/// Tier 1: substring inside one named column / 指定列子串匹配
pub struct ColumnStrategy;

#[async_trait]
impl SearchStrategy for ColumnStrategy {
    fn name(&self) -> &'static str {
        "column"
    }

    async fn attempt(&self, store: &RecordStore, query: &SearchQuery) -> Result<Option<Vec<Record>>, RecordError> {
        let Some(column) = query.column.as_deref() else {
            return Ok(None);
        };

        Ok(Some(store.match_column(column, &query.term, query.limit).await?))
    }
}

/// Tier 2: natural-language match on the FTS index, hits trusted as-is / 全文索引
pub struct FullTextStrategy;

#[async_trait]
impl SearchStrategy for FullTextStrategy {
    fn name(&self) -> &'static str {
        "fulltext"
    }

    async fn attempt(&self, store: &RecordStore, query: &SearchQuery) -> Result<Option<Vec<Record>>, RecordError> {
        if query.column.is_some() || !store.fulltext_available() {
            return Ok(None);
        }
        let Some(fts_query) = build_fts_query(&query.term) else {
            return Ok(None);
        };

        match store.match_fulltext(&fts_query, query.limit).await {
            Ok(records) => Ok(Some(records)),
            Err(e) if e.is_query_rejected() => {
                tracing::warn!("Full-text query rejected, falling back: {}", e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// Tier 3: substring over searchable text / 搜索文本子串匹配
pub struct SearchableTextStrategy;

#[async_trait]
impl SearchStrategy for SearchableTextStrategy {
    fn name(&self) -> &'static str {
        "substring"
    }

    async fn attempt(&self, store: &RecordStore, query: &SearchQuery) -> Result<Option<Vec<Record>>, RecordError> {
        if query.column.is_some() {
            return Ok(None);
        }
        Ok(Some(store.match_searchable_text(&query.term, query.limit).await?))
    }
}

/// Tier 4: substring over the stored payload encoding / 原始数据匹配
pub struct RawPayloadStrategy;

#[async_trait]
impl SearchStrategy for RawPayloadStrategy {
    fn name(&self) -> &'static str {
        "raw_payload"
    }

    async fn attempt(&self, store: &RecordStore, query: &SearchQuery) -> Result<Option<Vec<Record>>, RecordError> {
        if query.column.is_some() {
            return Ok(None);
        }
        Ok(Some(store.match_raw_payload(&query.term, query.limit).await?))
    }
}

/// Default tier order / 默认层级顺序
pub fn default_strategies(fulltext: bool) -> Vec<Box<dyn SearchStrategy>> {
    let mut strategies: Vec<Box<dyn SearchStrategy>> = vec![Box::new(ColumnStrategy)];
    if fulltext {
        strategies.push(Box::new(FullTextStrategy));
    }
    strategies.push(Box::new(SearchableTextStrategy));
    strategies.push(Box::new(RawPayloadStrategy));
    strategies
}
