use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RecordError;

/// Schema-less record data: column name -> cell value, in column order / 记录数据
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(IndexMap<String, String>);

impl Payload {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Build a payload from an arbitrary JSON value / 从JSON值构建
    ///
    /// Objects of scalars only. Numbers and booleans keep their textual form,
    /// null becomes an empty cell.
    pub fn from_json(value: Value) -> Result<Self, RecordError> {
        let map = match value {
            Value::Object(map) => map,
            other => {
                return Err(RecordError::invalid(format!(
                    "expected a map of columns, got {}",
                    json_kind(&other)
                )))
            }
        };

        let mut payload = Payload::new();
        for (key, value) in map {
            let cell = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null => String::new(),
                other => {
                    return Err(RecordError::invalid(format!(
                        "column '{}' holds a nested {}",
                        key,
                        json_kind(&other)
                    )))
                }
            };
            payload.insert(key, cell);
        }
        Ok(payload)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Remove a column, keeping the order of the others / 删除列（保持顺序）
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// At least one column carries a non-blank value / 至少有一个非空值
    pub fn has_content(&self) -> bool {
        self.0.values().any(|v| !v.trim().is_empty())
    }

    /// Flattened text for whole-record search / 全文搜索用的文本
    pub fn searchable_text(&self) -> String {
        self.0
            .values()
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// First three non-empty columns as `key: value | ...` / 摘要
    pub fn summary(&self) -> String {
        self.0
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .take(3)
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect::<Vec<_>>()
            .join(" | ")
    }

    /// Canonical stored encoding / 存储编码
    pub fn encode(&self) -> Result<String, RecordError> {
        Ok(serde_json::to_string(&self.0)?)
    }

    pub fn decode(data: &str) -> Result<Self, RecordError> {
        Ok(serde_json::from_str(data)?)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Payload {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Stored record / 记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    pub payload: Payload,
    pub searchable_text: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Raw `records` row / 数据库行
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RecordRow {
    pub id: i64,
    pub data: String,
    pub searchable_text: String,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<RecordRow> for Record {
    type Error = RecordError;

    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        Ok(Record {
            id: row.id,
            payload: Payload::decode(&row.data)?,
            searchable_text: row.searchable_text,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// One page of records / 分页结果
#[derive(Debug, Clone, Serialize)]
pub struct RecordPage {
    pub records: Vec<Record>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u64,
}

/// Store statistics / 统计信息
#[derive(Debug, Clone, Serialize)]
pub struct Statistics {
    pub total_records: u64,
    pub total_columns: usize,
    pub columns: Vec<String>,
}
