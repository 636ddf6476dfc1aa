//! Mutation service - point writes that keep derived text in sync / 单条记录写入
//!
//! All writes go through `RecordStore::insert` / `update`, which recompute
//! `searchable_text`. Concurrent edits of one record are last-write-wins.

use serde::Serialize;
use std::sync::Arc;

use crate::error::RecordError;
use crate::models::Payload;
use crate::store::RecordStore;
use crate::utils::{sanitize_key, sanitize_value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveAction {
    Created,
    Updated,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaveOutcome {
    pub success: bool,
    pub record_id: i64,
    pub action: SaveAction,
}

impl SaveOutcome {
    pub fn message(&self) -> &'static str {
        match self.action {
            SaveAction::Created => "Record created successfully",
            SaveAction::Updated => "Record updated successfully",
        }
    }
}

pub struct MutationService {
    store: Arc<RecordStore>,
}

impl MutationService {
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }

    /// Insert when `id` is absent or not positive, update otherwise / 保存（新增或更新）
    pub async fn save(&self, id: Option<i64>, fields: Vec<(String, String)>) -> Result<SaveOutcome, RecordError> {
        let payload = sanitize_fields(fields);
        if payload.is_empty() {
            return Err(RecordError::invalid("No valid data provided"));
        }

        match id.filter(|id| *id > 0) {
            Some(id) => {
                if !self.store.update(id, &payload).await? {
                    return Err(RecordError::NotFound(id));
                }
                tracing::info!("Record {} updated ({} columns)", id, payload.len());
                Ok(SaveOutcome {
                    success: true,
                    record_id: id,
                    action: SaveAction::Updated,
                })
            }
            None => {
                let id = self.store.insert(&payload).await?;
                tracing::info!("Record {} created ({} columns)", id, payload.len());
                Ok(SaveOutcome {
                    success: true,
                    record_id: id,
                    action: SaveAction::Created,
                })
            }
        }
    }

    /// Replace exactly one column of a record / 修改单个字段
    ///
    /// A value that sanitizes to empty removes the column.
    pub async fn set_field(&self, id: i64, column: &str, value: &str) -> Result<Payload, RecordError> {
        let column = sanitize_key(column);
        if column.is_empty() {
            return Err(RecordError::invalid("Column name is empty"));
        }

        let mut payload = self.store.get(id).await?.payload;
        let value = sanitize_value(value);
        if value.is_empty() {
            payload.remove(&column);
        } else {
            payload.insert(column, value);
        }

        if !self.store.update(id, &payload).await? {
            // deleted between read and write
            return Err(RecordError::NotFound(id));
        }
        Ok(payload)
    }

    /// Delete a record; false when it did not exist / 删除记录
    pub async fn delete(&self, id: i64) -> Result<bool, RecordError> {
        let deleted = self.store.delete(id).await?;
        if deleted {
            tracing::info!("Record {} deleted", id);
        }
        Ok(deleted)
    }
}

/// Clean submitted fields, dropping the ones left empty / 清理提交的字段
pub fn sanitize_fields(fields: Vec<(String, String)>) -> Payload {
    fields
        .into_iter()
        .map(|(k, v)| (sanitize_key(&k), sanitize_value(&v)))
        .filter(|(k, v)| !k.is_empty() && !v.is_empty())
        .collect()
}
