//! Pre-import checks and upload feedback / 导入前校验

use serde::Serialize;
use serde_json::Value;

/// Row count above which an import is flagged as large / 大数据集阈值
pub const LARGE_IMPORT_ROWS: usize = 10_000;
/// Rows echoed back after an import / 预览行数
pub const PREVIEW_ROWS: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct ImportValidation {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub total_rows: usize,
    pub valid_rows: usize,
}

/// Column as shown to the admin after upload / 列映射
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnMapping {
    pub original: String,
    pub display: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Check parsed rows before they are imported / 校验导入数据
pub fn validate_import(rows: &[Value]) -> ImportValidation {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if rows.is_empty() {
        errors.push("No data to validate".to_string());
    }

    let empty_rows = rows.iter().filter(|row| is_empty_row(row)).count();
    if empty_rows > 0 {
        warnings.push(format!("{} empty rows found and will be skipped", empty_rows));
    }

    if rows.len() > LARGE_IMPORT_ROWS {
        warnings.push("Large dataset detected. Import may take some time.".to_string());
    }

    ImportValidation {
        valid: errors.is_empty(),
        errors,
        warnings,
        total_rows: rows.len(),
        valid_rows: rows.len() - empty_rows,
    }
}

/// A row with no object shape or no non-blank cell / 空行
fn is_empty_row(row: &Value) -> bool {
    match row.as_object() {
        Some(map) => map.values().all(|v| match v {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            _ => false,
        }),
        None => true,
    }
}

/// Columns of the first row, in order / 首行列映射
pub fn column_mapping(first_row: &Value) -> Vec<ColumnMapping> {
    first_row
        .as_object()
        .map(|map| {
            map.keys()
                .map(|key| ColumnMapping {
                    original: key.clone(),
                    display: key.clone(),
                    kind: "text".to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// First rows of an import / 导入预览
pub fn preview(rows: &[Value]) -> Vec<Value> {
    rows.iter().take(PREVIEW_ROWS).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_input_is_invalid() {
        let result = validate_import(&[]);
        assert!(!result.valid);
        assert_eq!(result.total_rows, 0);
    }

    #[test]
    fn test_empty_rows_warn() {
        let rows = vec![json!({"a": "1"}), json!({"a": " ", "b": null}), json!("junk")];
        let result = validate_import(&rows);
        assert!(result.valid);
        assert_eq!(result.valid_rows, 1);
        assert_eq!(result.warnings, vec!["2 empty rows found and will be skipped"]);
    }

    #[test]
    fn test_large_import_warns() {
        let rows = vec![json!({"a": "1"}); LARGE_IMPORT_ROWS + 1];
        let result = validate_import(&rows);
        assert!(result.valid);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_column_mapping_follows_first_row() {
        let mapping = column_mapping(&json!({"Name": "x", "Email": "y"}));
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping[0].original, "Name");
        assert_eq!(mapping[1].display, "Email");
        assert_eq!(mapping[1].kind, "text");
        assert!(column_mapping(&json!(null)).is_empty());
    }

    #[test]
    fn test_preview_takes_five() {
        let rows: Vec<Value> = (0..8).map(|i| json!({"n": i})).collect();
        assert_eq!(preview(&rows).len(), PREVIEW_ROWS);
    }
}
