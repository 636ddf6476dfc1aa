//! Tabular export of stored records / 记录导出

use indexmap::IndexSet;
use serde::Serialize;

use crate::models::Record;

/// Header cell for the record id / ID 列名
pub const ID_COLUMN: &str = "ID";

/// Records flattened into a header plus rows / 导出表格
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ExportTable {
    /// Build a table from records, keeping their order.
    ///
    /// Columns are `ID` followed by every payload key in first-seen order;
    /// a record lacking a column gets an empty cell.
    pub fn from_records(records: &[Record]) -> Self {
        let keys: IndexSet<&str> = records.iter().flat_map(|r| r.payload.keys()).collect();

        let rows = records
            .iter()
            .map(|record| {
                std::iter::once(record.id.to_string())
                    .chain(keys.iter().map(|k| record.payload.get(k).unwrap_or_default().to_string()))
                    .collect()
            })
            .collect();

        let columns = std::iter::once(ID_COLUMN.to_string())
            .chain(keys.iter().map(|k| k.to_string()))
            .collect();

        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Payload;

    fn record(id: i64, pairs: &[(&str, &str)]) -> Record {
        let payload: Payload = pairs.iter().copied().collect();
        Record {
            id,
            searchable_text: payload.searchable_text(),
            payload,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_union_of_columns_in_first_seen_order() {
        let records = vec![
            record(2, &[("name", "Beta"), ("city", "Provo")]),
            record(1, &[("email", "a@x.io"), ("name", "Acme")]),
        ];
        let table = ExportTable::from_records(&records);

        assert_eq!(table.columns, vec!["ID", "name", "city", "email"]);
        assert_eq!(table.rows[0], vec!["2", "Beta", "Provo", ""]);
        assert_eq!(table.rows[1], vec!["1", "Acme", "", "a@x.io"]);
    }

    #[test]
    fn test_empty_export() {
        let table = ExportTable::from_records(&[]);
        assert!(table.is_empty());
        assert_eq!(table.columns, vec!["ID"]);
    }
}
