//! Search engine - tiered fallback over the record store / 搜索引擎
//!
//! Read-only with respect to the store. Tiers are tried in order and the first
//! non-empty answer wins, so results never need deduplication.

use std::sync::Arc;

use super::schema::{SearchHit, SearchQuery, SearchResults};
use super::strategy::{default_strategies, SearchStrategy};
use super::MIN_TERM_CHARS;
use crate::config::SearchConfig;
use crate::error::RecordError;
use crate::store::RecordStore;

pub struct SearchEngine {
    store: Arc<RecordStore>,
    strategies: Vec<Box<dyn SearchStrategy>>,
    detail_url_base: String,
}

impl SearchEngine {
    pub fn new(store: Arc<RecordStore>, config: &SearchConfig) -> Self {
        Self::with_strategies(
            store,
            default_strategies(config.fulltext),
            config.detail_url_base.clone(),
        )
    }

    pub fn with_strategies(
        store: Arc<RecordStore>,
        strategies: Vec<Box<dyn SearchStrategy>>,
        detail_url_base: String,
    ) -> Self {
        Self {
            store,
            strategies,
            detail_url_base,
        }
    }

    /// Search records, newest first, at most 50 / 搜索记录
    pub async fn search(&self, term: &str, column: Option<&str>) -> Result<Vec<SearchHit>, RecordError> {
        Ok(self.run(&SearchQuery::new(term, column)).await?.hits)
    }

    /// Run a query and report which tier answered / 执行查询
    pub async fn run(&self, query: &SearchQuery) -> Result<SearchResults, RecordError> {
        if query.term_chars() < MIN_TERM_CHARS || query.limit == 0 {
            return Ok(SearchResults::default());
        }

        for strategy in &self.strategies {
            let Some(mut records) = strategy.attempt(&self.store, query).await? else {
                continue;
            };
            if records.is_empty() {
                continue;
            }

            records.sort_by(|a, b| b.id.cmp(&a.id));
            records.truncate(query.limit);

            tracing::debug!(
                "Search '{}' (column {:?}) answered by {} tier: {} hits",
                query.term,
                query.column,
                strategy.name(),
                records.len()
            );

            let hits = records
                .into_iter()
                .map(|r| SearchHit::from_record(r, &self.detail_url_base))
                .collect();
            return Ok(SearchResults {
                hits,
                strategy: Some(strategy.name()),
            });
        }

        tracing::debug!("Search '{}' (column {:?}): no results", query.term, query.column);
        Ok(SearchResults::default())
    }
}
