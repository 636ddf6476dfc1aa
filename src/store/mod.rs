//! Record store - the only owner of the `records` table / 记录存储
//!
//! Every write recomputes `searchable_text` (and its lowercase twin) from the
//! payload; nothing else may edit them. Single-record writes are atomic,
//! there is no cross-record transaction.

use chrono::{SecondsFormat, Utc};
use indexmap::IndexSet;
use sqlx::SqlitePool;

use crate::db::{self, SchemaInfo};
use crate::error::RecordError;
use crate::models::{Payload, Record, RecordPage, RecordRow, Statistics};
use crate::utils::contains_pattern;

/// Largest page `list` will return / 每页上限
pub const MAX_PER_PAGE: u32 = 100;
/// Records sampled by `column_names` / 列名采样数
pub const COLUMN_SAMPLE_SIZE: i64 = 100;

const RECORD_COLUMNS: &str = "id, data, searchable_text, created_at, updated_at";

pub struct RecordStore {
    db: SqlitePool,
    fulltext: bool,
}

impl RecordStore {
    /// Wrap an already migrated pool / 使用已迁移的连接池
    pub fn new(db: SqlitePool, schema: SchemaInfo) -> Self {
        Self {
            db,
            fulltext: schema.fulltext,
        }
    }

    /// Run migrations then wrap the pool / 迁移并创建
    pub async fn open(db: SqlitePool) -> Result<Self, RecordError> {
        let schema = db::run_migrations(&db).await?;
        Ok(Self::new(db, schema))
    }

    /// Whether the FTS mirror exists / 全文索引是否可用
    pub fn fulltext_available(&self) -> bool {
        self.fulltext
    }

    pub async fn close(&self) {
        self.db.close().await;
    }

    /// Insert a record, returns the new id / 插入记录
    pub async fn insert(&self, payload: &Payload) -> Result<i64, RecordError> {
        ensure_content(payload)?;
        let data = payload.encode()?;
        let text = payload.searchable_text();
        let now = timestamp();

        let result = sqlx::query(
            "INSERT INTO records (data, searchable_text, searchable_lower, data_lower, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&data)
        .bind(&text)
        .bind(text.to_lowercase())
        .bind(data.to_lowercase())
        .bind(&now)
        .bind(&now)
        .execute(&self.db)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Replace a payload; false when the id does not exist / 更新记录
    pub async fn update(&self, id: i64, payload: &Payload) -> Result<bool, RecordError> {
        ensure_content(payload)?;
        let data = payload.encode()?;
        let text = payload.searchable_text();

        let result = sqlx::query(
            "UPDATE records SET data = ?, searchable_text = ?, searchable_lower = ?, data_lower = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&data)
        .bind(&text)
        .bind(text.to_lowercase())
        .bind(data.to_lowercase())
        .bind(timestamp())
        .bind(id)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a record; false when nothing was deleted / 删除记录（幂等）
    pub async fn delete(&self, id: i64) -> Result<bool, RecordError> {
        let result = sqlx::query("DELETE FROM records WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn get(&self, id: i64) -> Result<Record, RecordError> {
        let row: Option<RecordRow> =
            sqlx::query_as(&format!("SELECT {} FROM records WHERE id = ?", RECORD_COLUMNS))
                .bind(id)
                .fetch_optional(&self.db)
                .await?;

        match row {
            Some(row) => Record::try_from(row),
            None => Err(RecordError::NotFound(id)),
        }
    }

    pub async fn count(&self) -> Result<u64, RecordError> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM records")
            .fetch_one(&self.db)
            .await?;
        Ok(total.max(0) as u64)
    }

    /// Page through records, newest first / 分页列出（按id倒序）
    ///
    /// `page >= 1`, `1 <= per_page <= 100`.
    pub async fn list(&self, page: u32, per_page: u32) -> Result<RecordPage, RecordError> {
        let page = page.max(1);
        let per_page = per_page.clamp(1, MAX_PER_PAGE);
        let offset = (page as i64 - 1) * per_page as i64;

        let total = self.count().await?;
        let rows: Vec<RecordRow> = sqlx::query_as(&format!(
            "SELECT {} FROM records ORDER BY id DESC LIMIT ? OFFSET ?",
            RECORD_COLUMNS
        ))
        .bind(per_page as i64)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        Ok(RecordPage {
            records: decode_rows(rows),
            total,
            page,
            per_page,
            total_pages: total.div_ceil(per_page as u64),
        })
    }

    /// Every record, newest first (export input) / 全部记录
    pub async fn all_records(&self) -> Result<Vec<Record>, RecordError> {
        let rows: Vec<RecordRow> =
            sqlx::query_as(&format!("SELECT {} FROM records ORDER BY id DESC", RECORD_COLUMNS))
                .fetch_all(&self.db)
                .await?;
        Ok(decode_rows(rows))
    }

    /// Known column names, sampled from the 100 newest records / 列名（采样）
    ///
    /// Not exhaustive: columns that only appear in older records are missed.
    pub async fn column_names(&self) -> Result<Vec<String>, RecordError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT data FROM records ORDER BY id DESC LIMIT ?")
                .bind(COLUMN_SAMPLE_SIZE)
                .fetch_all(&self.db)
                .await?;

        let mut columns: IndexSet<String> = IndexSet::new();
        for (data,) in rows {
            match Payload::decode(&data) {
                Ok(payload) => columns.extend(payload.keys().map(str::to_string)),
                Err(e) => tracing::warn!("Skipping undecodable record while sampling columns: {}", e),
            }
        }
        Ok(columns.into_iter().collect())
    }

    pub async fn statistics(&self) -> Result<Statistics, RecordError> {
        let total_records = self.count().await?;
        let columns = self.column_names().await?;
        Ok(Statistics {
            total_records,
            total_columns: columns.len(),
            columns,
        })
    }

    /// Remove every record. Ids keep counting up / 清空全部数据
    pub async fn clear_all(&self) -> Result<u64, RecordError> {
        let result = sqlx::query("DELETE FROM records").execute(&self.db).await?;
        tracing::info!("Cleared {} records", result.rows_affected());
        Ok(result.rows_affected())
    }

    /// Recompute derived text where it is missing / 修复缺失的搜索文本
    ///
    /// Covers blank `searchable_text` and rows that predate `data_lower`.
    pub async fn rebuild_searchable_text(&self) -> Result<u64, RecordError> {
        let rows: Vec<(i64, String)> =
            sqlx::query_as("SELECT id, data FROM records WHERE searchable_text = '' OR data_lower = ''")
                .fetch_all(&self.db)
                .await?;

        let mut repaired = 0;
        for (id, data) in rows {
            let payload = match Payload::decode(&data) {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::warn!("Record {} has an undecodable payload: {}", id, e);
                    continue;
                }
            };
            let text = payload.searchable_text();
            if text.is_empty() {
                continue;
            }
            sqlx::query(
                "UPDATE records SET searchable_text = ?, searchable_lower = ?, data_lower = ? WHERE id = ?",
            )
            .bind(&text)
            .bind(text.to_lowercase())
            .bind(data.to_lowercase())
            .bind(id)
            .execute(&self.db)
            .await?;
            repaired += 1;
        }

        if repaired > 0 {
            tracing::info!("Rebuilt searchable text for {} records", repaired);
        }
        Ok(repaired)
    }

    /// Column-scoped substring match / 指定列匹配
    ///
    /// SQLite only narrows to records that have the column; the
    /// case-insensitive containment test runs here, on Unicode-lowercased
    /// text, and the limit applies after it.
    pub async fn match_column(&self, column: &str, term: &str, limit: usize) -> Result<Vec<Record>, RecordError> {
        let rows: Vec<RecordRow> = sqlx::query_as(&format!(
            r#"SELECT {} FROM records r
            WHERE EXISTS (SELECT 1 FROM json_each(r.data) j WHERE j.key = ?)
            ORDER BY r.id DESC"#,
            qualified_columns()
        ))
        .bind(column)
        .fetch_all(&self.db)
        .await?;

        let needle = term.to_lowercase();
        Ok(decode_rows(rows)
            .into_iter()
            .filter(|r| {
                r.payload
                    .get(column)
                    .is_some_and(|value| value.to_lowercase().contains(&needle))
            })
            .take(limit)
            .collect())
    }

    /// Full-text match against the FTS mirror / 全文索引匹配
    pub async fn match_fulltext(&self, fts_query: &str, limit: usize) -> Result<Vec<Record>, RecordError> {
        let rows: Vec<RecordRow> = sqlx::query_as(&format!(
            r#"SELECT {} FROM records_fts f
            JOIN records r ON r.id = f.rowid
            WHERE records_fts MATCH ?
            ORDER BY r.id DESC LIMIT ?"#,
            qualified_columns()
        ))
        .bind(fts_query)
        .bind(limit as i64)
        .fetch_all(&self.db)
        .await?;
        Ok(decode_rows(rows))
    }

    /// Case-insensitive substring over searchable text / 搜索文本子串匹配
    pub async fn match_searchable_text(&self, term: &str, limit: usize) -> Result<Vec<Record>, RecordError> {
        let rows: Vec<RecordRow> = sqlx::query_as(&format!(
            r#"SELECT {} FROM records
            WHERE searchable_lower LIKE ? ESCAPE '\'
            ORDER BY id DESC LIMIT ?"#,
            RECORD_COLUMNS
        ))
        .bind(contains_pattern(&term.to_lowercase()))
        .bind(limit as i64)
        .fetch_all(&self.db)
        .await?;
        Ok(decode_rows(rows))
    }

    /// Substring over the stored payload encoding / 原始数据子串匹配
    pub async fn match_raw_payload(&self, term: &str, limit: usize) -> Result<Vec<Record>, RecordError> {
        let rows: Vec<RecordRow> = sqlx::query_as(&format!(
            r#"SELECT {} FROM records
            WHERE data_lower LIKE ? ESCAPE '\'
            ORDER BY id DESC LIMIT ?"#,
            RECORD_COLUMNS
        ))
        .bind(contains_pattern(&term.to_lowercase()))
        .bind(limit as i64)
        .fetch_all(&self.db)
        .await?;
        Ok(decode_rows(rows))
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.db
    }
}

/// Fixed-width RFC 3339 so stored timestamps order as text / 时间戳
fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn qualified_columns() -> String {
    RECORD_COLUMNS
        .split(", ")
        .map(|c| format!("r.{}", c))
        .collect::<Vec<_>>()
        .join(", ")
}

fn ensure_content(payload: &Payload) -> Result<(), RecordError> {
    if payload.is_empty() {
        return Err(RecordError::invalid("payload has no columns"));
    }
    if !payload.has_content() {
        return Err(RecordError::invalid("payload has no non-empty values"));
    }
    Ok(())
}

/// Decode rows, dropping the ones whose payload is corrupt / 解码行
fn decode_rows(rows: Vec<RecordRow>) -> Vec<Record> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.id;
            match Record::try_from(row) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!("Skipping record {}: {}", id, e);
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> RecordStore {
        let db = db::open_in_memory().await.unwrap();
        RecordStore::open(db).await.unwrap()
    }

    fn payload(pairs: &[(&str, &str)]) -> Payload {
        pairs.iter().copied().collect()
    }

    #[tokio::test]
    async fn test_insert_get_roundtrip() {
        let store = store().await;
        let p = payload(&[("name", "Acme Corp"), ("city", "Reno"), ("note", "")]);

        let id = store.insert(&p).await.unwrap();
        let record = store.get(id).await.unwrap();

        assert_eq!(record.payload, p);
        assert_eq!(record.searchable_text, "Acme Corp Reno");
        assert_eq!(record.created_at, record.updated_at);
    }

    #[tokio::test]
    async fn test_insert_rejects_empty_payloads() {
        let store = store().await;
        let err = store.insert(&Payload::new()).await.unwrap_err();
        assert!(matches!(err, RecordError::InvalidPayload(_)));

        let err = store.insert(&payload(&[("a", " ")])).await.unwrap_err();
        assert!(matches!(err, RecordError::InvalidPayload(_)));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_recomputes_searchable_text() {
        let store = store().await;
        let id = store.insert(&payload(&[("name", "Old Name")])).await.unwrap();

        let updated = store
            .update(id, &payload(&[("name", "New Name"), ("city", "Provo")]))
            .await
            .unwrap();
        assert!(updated);

        let record = store.get(id).await.unwrap();
        assert_eq!(record.searchable_text, "New Name Provo");
        assert_eq!(record.payload.get("city"), Some("Provo"));

        let hits = store.match_searchable_text("old", 50).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_update_refreshes_updated_at_only() {
        let store = store().await;
        let id = store.insert(&payload(&[("name", "Acme")])).await.unwrap();
        let before = store.get(id).await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store.update(id, &payload(&[("name", "Acme Corp")])).await.unwrap();
        let after = store.get(id).await.unwrap();

        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at > after.created_at);

        let created = chrono::DateTime::parse_from_rfc3339(&after.created_at).unwrap();
        let updated = chrono::DateTime::parse_from_rfc3339(&after.updated_at).unwrap();
        assert!(updated > created);
    }

    #[tokio::test]
    async fn test_column_match_folds_non_ascii_case() {
        let store = store().await;
        let id = store
            .insert(&payload(&[("city", "MÜNCHEN"), ("name", "Öl GmbH")]))
            .await
            .unwrap();
        store.insert(&payload(&[("name", "münchen")])).await.unwrap();

        let hits = store.match_column("city", "münchen", 50).await.unwrap();
        assert_eq!(hits.iter().map(|r| r.id).collect::<Vec<_>>(), vec![id]);
    }

    #[tokio::test]
    async fn test_column_match_limit_applies_after_filter() {
        let store = store().await;
        let mut wanted = Vec::new();
        for i in 0..4 {
            wanted.push(store.insert(&payload(&[("city", "Ürgüp")])).await.unwrap());
            // newer rows with the column but no match
            store.insert(&payload(&[("city", &format!("Reno {}", i))])).await.unwrap();
        }

        let hits = store.match_column("city", "ÜRGÜP", 3).await.unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].id, wanted[3]);
    }

    #[tokio::test]
    async fn test_raw_payload_match_folds_non_ascii_case() {
        let store = store().await;
        let id = store.insert(&payload(&[("name", "ÉCOLE Öl")])).await.unwrap();

        let hits = store.match_raw_payload("école öl", 50).await.unwrap();
        assert_eq!(hits.iter().map(|r| r.id).collect::<Vec<_>>(), vec![id]);
    }

    #[tokio::test]
    async fn test_update_missing_id_returns_false() {
        let store = store().await;
        assert!(!store.update(42, &payload(&[("a", "1")])).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = store().await;
        let id = store.insert(&payload(&[("a", "1")])).await.unwrap();

        assert!(store.delete(id).await.unwrap());
        assert!(matches!(store.get(id).await, Err(RecordError::NotFound(missing)) if missing == id));
        assert!(!store.delete(id).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_pages_newest_first() {
        let store = store().await;
        for i in 0..7 {
            store.insert(&payload(&[("n", &i.to_string())])).await.unwrap();
        }

        let first = store.list(1, 3).await.unwrap();
        assert_eq!(first.total, 7);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.records.len(), 3);
        assert_eq!(first.records[0].payload.get("n"), Some("6"));

        let last = store.list(3, 3).await.unwrap();
        assert_eq!(last.records.len(), 1);
        assert_eq!(last.records[0].payload.get("n"), Some("0"));
    }

    #[tokio::test]
    async fn test_list_clamps_arguments() {
        let store = store().await;
        store.insert(&payload(&[("a", "1")])).await.unwrap();

        let page = store.list(0, 0).await.unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.per_page, 1);

        let page = store.list(1, 5000).await.unwrap();
        assert_eq!(page.per_page, MAX_PER_PAGE);
        assert_eq!(page.total_pages, 1);
    }

    #[tokio::test]
    async fn test_column_names_union_in_first_seen_order() {
        let store = store().await;
        store.insert(&payload(&[("name", "a"), ("city", "b")])).await.unwrap();
        store.insert(&payload(&[("email", "c"), ("name", "d")])).await.unwrap();

        let columns = store.column_names().await.unwrap();
        assert_eq!(columns, vec!["email", "name", "city"]);

        let stats = store.statistics().await.unwrap();
        assert_eq!(stats.total_records, 2);
        assert_eq!(stats.total_columns, 3);
    }

    #[tokio::test]
    async fn test_column_names_only_sample_recent_records() {
        let store = store().await;
        store.insert(&payload(&[("legacy", "x")])).await.unwrap();
        for _ in 0..COLUMN_SAMPLE_SIZE {
            store.insert(&payload(&[("name", "y")])).await.unwrap();
        }

        let columns = store.column_names().await.unwrap();
        assert_eq!(columns, vec!["name"]);
    }

    #[tokio::test]
    async fn test_clear_all_never_reuses_ids() {
        let store = store().await;
        let first = store.insert(&payload(&[("a", "1")])).await.unwrap();
        store.insert(&payload(&[("a", "2")])).await.unwrap();

        assert_eq!(store.clear_all().await.unwrap(), 2);
        assert_eq!(store.count().await.unwrap(), 0);

        let next = store.insert(&payload(&[("a", "3")])).await.unwrap();
        assert!(next > first + 1);
    }

    #[tokio::test]
    async fn test_rebuild_searchable_text_repairs_blank_rows() {
        let store = store().await;
        let id = store.insert(&payload(&[("name", "Gamma")])).await.unwrap();
        sqlx::query("UPDATE records SET searchable_text = '', searchable_lower = '' WHERE id = ?")
            .bind(id)
            .execute(store.pool())
            .await
            .unwrap();

        assert_eq!(store.rebuild_searchable_text().await.unwrap(), 1);
        assert_eq!(store.get(id).await.unwrap().searchable_text, "Gamma");
        assert_eq!(store.rebuild_searchable_text().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_rebuild_fills_missing_data_lower() {
        let store = store().await;
        let id = store.insert(&payload(&[("name", "ÄRZTE")])).await.unwrap();
        sqlx::query("UPDATE records SET data_lower = '' WHERE id = ?")
            .bind(id)
            .execute(store.pool())
            .await
            .unwrap();
        assert!(store.match_raw_payload("ärzte", 50).await.unwrap().is_empty());

        assert_eq!(store.rebuild_searchable_text().await.unwrap(), 1);
        assert_eq!(store.match_raw_payload("ärzte", 50).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_rows_are_skipped_in_listings() {
        let store = store().await;
        store.insert(&payload(&[("a", "ok")])).await.unwrap();
        let bad = store.insert(&payload(&[("a", "bad")])).await.unwrap();
        sqlx::query("UPDATE records SET data = 'not json' WHERE id = ?")
            .bind(bad)
            .execute(store.pool())
            .await
            .unwrap();

        let page = store.list(1, 10).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.records.len(), 1);
        assert!(matches!(store.get(bad).await, Err(RecordError::CorruptPayload(_))));
    }
}
