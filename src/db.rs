//! Record database: connection pool and schema / 记录数据库
//!
//! - WAL mode for concurrent readers and writers
//! - `records` is the source of truth
//! - `records_fts` (FTS5, external content) mirrors `searchable_text` through triggers

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use crate::error::RecordError;

/// Open the record database (WAL mode) / 打开数据库
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, RecordError> {
    let db = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect(database_url)
        .await?;

    // 启用WAL模式，提高并发性能
    sqlx::query("PRAGMA journal_mode=WAL").execute(&db).await?;
    // 设置busy_timeout，避免锁超时
    sqlx::query("PRAGMA busy_timeout=5000").execute(&db).await?;
    sqlx::query("PRAGMA synchronous=NORMAL").execute(&db).await?;

    tracing::info!("Record database connected: {} (WAL mode)", database_url);
    Ok(db)
}

/// Single-connection in-memory database / 内存数据库
///
/// One connection that never idles out, otherwise every new connection
/// would see a fresh empty database.
pub async fn open_in_memory() -> Result<SqlitePool, RecordError> {
    let db = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;
    Ok(db)
}

/// Schema facts discovered while migrating / 迁移结果
#[derive(Debug, Clone, Copy)]
pub struct SchemaInfo {
    pub fulltext: bool,
}

/// Create tables, indexes and the full-text mirror / 初始化表结构
/// 只在表不存在时创建，不删除已有数据
pub async fn run_migrations(db: &SqlitePool) -> Result<SchemaInfo, RecordError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            data TEXT NOT NULL,
            searchable_text TEXT NOT NULL DEFAULT '',
            searchable_lower TEXT NOT NULL DEFAULT '',
            data_lower TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(db)
    .await?;

    // 旧库补充 data_lower 列，由 rebuild_searchable_text 回填
    let columns: Vec<(String,)> = sqlx::query_as("SELECT name FROM pragma_table_info('records')")
        .fetch_all(db)
        .await?;
    if !columns.iter().any(|(name,)| name == "data_lower") {
        sqlx::query("ALTER TABLE records ADD COLUMN data_lower TEXT NOT NULL DEFAULT ''")
            .execute(db)
            .await?;
        tracing::info!("Added data_lower column to records");
    }

    let fulltext = match create_fulltext(db).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Full-text index unavailable, substring search only: {}", e);
            false
        }
    };

    Ok(SchemaInfo { fulltext })
}

async fn create_fulltext(db: &SqlitePool) -> Result<(), sqlx::Error> {
    let existed: Option<(String,)> = sqlx::query_as(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'records_fts'",
    )
    .fetch_optional(db)
    .await?;

    sqlx::query(
        r#"
        CREATE VIRTUAL TABLE IF NOT EXISTS records_fts USING fts5(
            searchable_text,
            content='records', content_rowid='id',
            tokenize='unicode61'
        )
        "#,
    )
    .execute(db)
    .await?;

    sqlx::query(
        r#"
        CREATE TRIGGER IF NOT EXISTS records_ai AFTER INSERT ON records BEGIN
            INSERT INTO records_fts(rowid, searchable_text)
            VALUES (new.id, new.searchable_text);
        END
        "#,
    )
    .execute(db)
    .await?;

    sqlx::query(
        r#"
        CREATE TRIGGER IF NOT EXISTS records_ad AFTER DELETE ON records BEGIN
            INSERT INTO records_fts(records_fts, rowid, searchable_text)
            VALUES ('delete', old.id, old.searchable_text);
        END
        "#,
    )
    .execute(db)
    .await?;

    sqlx::query(
        r#"
        CREATE TRIGGER IF NOT EXISTS records_au AFTER UPDATE ON records BEGIN
            INSERT INTO records_fts(records_fts, rowid, searchable_text)
            VALUES ('delete', old.id, old.searchable_text);
            INSERT INTO records_fts(rowid, searchable_text)
            VALUES (new.id, new.searchable_text);
        END
        "#,
    )
    .execute(db)
    .await?;

    if existed.is_none() {
        // 新建索引时从已有数据重建
        sqlx::query("INSERT INTO records_fts(records_fts) VALUES ('rebuild')")
            .execute(db)
            .await?;
        tracing::info!("Full-text index created");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let db = open_in_memory().await.unwrap();
        let first = run_migrations(&db).await.unwrap();
        let second = run_migrations(&db).await.unwrap();
        assert_eq!(first.fulltext, second.fulltext);

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM records")
            .fetch_one(&db)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_legacy_table_gains_data_lower() {
        let db = open_in_memory().await.unwrap();
        sqlx::query(
            "CREATE TABLE records (id INTEGER PRIMARY KEY AUTOINCREMENT, data TEXT NOT NULL, searchable_text TEXT NOT NULL DEFAULT '', searchable_lower TEXT NOT NULL DEFAULT '', created_at TEXT NOT NULL, updated_at TEXT NOT NULL)",
        )
        .execute(&db)
        .await
        .unwrap();

        run_migrations(&db).await.unwrap();

        let columns: Vec<(String,)> = sqlx::query_as("SELECT name FROM pragma_table_info('records')")
            .fetch_all(&db)
            .await
            .unwrap();
        assert!(columns.iter().any(|(name,)| name == "data_lower"));
    }

    #[tokio::test]
    async fn test_fulltext_mirror_follows_rows() {
        let db = open_in_memory().await.unwrap();
        let schema = run_migrations(&db).await.unwrap();
        if !schema.fulltext {
            return;
        }

        sqlx::query(
            "INSERT INTO records (data, searchable_text, searchable_lower, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(r#"{"name":"Acme"}"#)
        .bind("Acme")
        .bind("acme")
        .bind("now")
        .bind("now")
        .execute(&db)
        .await
        .unwrap();

        let hits: Vec<(i64,)> = sqlx::query_as("SELECT rowid FROM records_fts WHERE records_fts MATCH 'acme'")
            .fetch_all(&db)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);

        sqlx::query("DELETE FROM records").execute(&db).await.unwrap();
        let hits: Vec<(i64,)> = sqlx::query_as("SELECT rowid FROM records_fts WHERE records_fts MATCH 'acme'")
            .fetch_all(&db)
            .await
            .unwrap();
        assert!(hits.is_empty());
    }
}
