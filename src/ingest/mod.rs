//! Ingest pipeline - bulk insertion of parsed rows / 批量导入
//!
//! Rows are inserted one by one; a bad row is recorded and skipped, only a
//! storage failure aborts the batch. There is no batch-level rollback.

pub mod validate;

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::error::{RecordError, RowError};
use crate::models::Payload;
use crate::store::RecordStore;

pub use validate::{column_mapping, preview, validate_import, ColumnMapping, ImportValidation};

/// Outcome of a bulk insert / 批量插入结果
#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkInsertReport {
    pub inserted_count: usize,
    pub inserted_ids: Vec<i64>,
    pub errors: Vec<RowError>,
}

impl BulkInsertReport {
    pub fn is_partial(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Human readable summary / 结果描述
    pub fn message(&self) -> String {
        let mut message = format!("{} records inserted successfully", self.inserted_count);
        if !self.errors.is_empty() {
            message.push_str(&format!(". {} errors occurred", self.errors.len()));
        }
        message
    }

    /// Error-typed view: any rejected row makes this a `PartialBatchFailure`.
    pub fn into_result(self) -> Result<usize, RecordError> {
        if self.errors.is_empty() {
            Ok(self.inserted_count)
        } else {
            Err(RecordError::PartialBatchFailure {
                inserted: self.inserted_count,
                errors: self.errors,
            })
        }
    }
}

pub struct IngestPipeline {
    store: Arc<RecordStore>,
}

impl IngestPipeline {
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }

    /// Insert every row independently / 逐行插入
    pub async fn bulk_insert(&self, rows: Vec<Value>) -> Result<BulkInsertReport, RecordError> {
        let total = rows.len();
        let mut report = BulkInsertReport::default();

        for (row, value) in rows.into_iter().enumerate() {
            let inserted = match Payload::from_json(value) {
                Ok(payload) => self.store.insert(&payload).await,
                Err(e) => Err(e),
            };

            match inserted {
                Ok(id) => {
                    report.inserted_count += 1;
                    report.inserted_ids.push(id);
                }
                Err(e @ RecordError::StorageUnavailable(_)) => {
                    tracing::error!(
                        "Bulk insert aborted at row {} of {} after {} inserts: {}",
                        row,
                        total,
                        report.inserted_count,
                        e
                    );
                    return Err(e);
                }
                Err(e) => report.errors.push(RowError {
                    row,
                    code: e.code(),
                    message: e.to_string(),
                }),
            }
        }

        tracing::info!(
            "Bulk insert finished: {} of {} rows inserted, {} rejected",
            report.inserted_count,
            total,
            report.errors.len()
        );
        Ok(report)
    }

    /// Insert already-built payloads / 插入已构建的记录
    pub async fn bulk_insert_payloads(&self, payloads: Vec<Payload>) -> Result<BulkInsertReport, RecordError> {
        let rows = payloads
            .into_iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        self.bulk_insert(rows).await
    }
}
