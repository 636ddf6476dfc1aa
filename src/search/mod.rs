//! Search module - read-only queries over the record store / 搜索模块
//!
//! Tiers, in order / 搜索层级：
//! 1. column: substring inside one named column (only with a column filter)
//! 2. fulltext: natural-language match on the FTS index
//! 3. substring: case-insensitive substring over searchable text
//! 4. raw_payload: substring over the stored payload encoding
//!
//! Tier 1 excludes 2-4; otherwise the first tier with hits wins.

pub mod engine;
pub mod query;
pub mod schema;
pub mod strategy;

pub use engine::SearchEngine;
pub use schema::{SearchHit, SearchQuery, SearchResults};
pub use strategy::SearchStrategy;

/// Terms shorter than this never search / 最短搜索词长度
pub const MIN_TERM_CHARS: usize = 2;
/// Hard cap on hits per search / 单次搜索结果上限
pub const MAX_RESULTS: usize = 50;
