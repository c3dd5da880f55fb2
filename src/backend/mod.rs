pub mod odbc;

use serde_json::Value;

use crate::config::DataSourceProfile;
use crate::error::DbrunError;

/// One result row: column name -> value, in the column order the engine returned.
pub type ResultRow = serde_json::Map<String, Value>;

/// Trait for query executors.
///
/// A job's SQL may hold several statements; the executor returns the rows of
/// every result set concatenated in order.
pub trait Backend {
    fn execute(
        &self,
        sql: &str,
        profile: &DataSourceProfile,
    ) -> impl std::future::Future<Output = Result<Vec<ResultRow>, DbrunError>> + Send;
}

/// A maximal run of consecutive rows sharing one column signature.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultGroup {
    pub columns: Vec<String>,
    pub rows: Vec<ResultRow>,
}

impl ResultGroup {
    fn open(row: ResultRow) -> Self {
        ResultGroup {
            columns: signature(&row),
            rows: vec![row],
        }
    }

    fn accepts(&self, row: &ResultRow) -> bool {
        self.columns.len() == row.len()
            && self.columns.iter().zip(row.keys()).all(|(a, b)| a == b)
    }
}

/// Ordered column names of a row.
pub fn signature(row: &ResultRow) -> Vec<String> {
    row.keys().cloned().collect()
}

/// Partition rows into contiguous groups with identical column signatures.
pub fn group(rows: Vec<ResultRow>) -> Vec<ResultGroup> {
    let mut groups: Vec<ResultGroup> = Vec::new();
    for row in rows {
        match groups.last_mut() {
            Some(current) if current.accepts(&row) => current.rows.push(row),
            _ => groups.push(ResultGroup::open(row)),
        }
    }
    groups
}

/// Text form of a cell: strings as-is, `NULL` for null, JSON text otherwise.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "NULL".to_string(),
        other => other.to_string(),
    }
}
