use serde::Serialize;

/// One result row, keyed by column name in column order.
pub type DbRow = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<DbRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecResult {
    pub changes: u64,
    pub last_insert_rowid: Option<i64>,
}

/// What running a statement produced: fetched rows for reads, a change count for writes.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecuteOutcome {
    Rows(QueryResult),
    Changes(ExecResult),
}

/// A column as reported by `pragma_table_info`, passed through unnormalised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDescriptor {
    pub cid: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub decl_type: String,
    pub notnull: bool,
    pub dflt_value: Option<String>,
    pub pk: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableDetail {
    pub schema: Vec<ColumnDescriptor>,
    pub samples: Vec<DbRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_rows: usize,
}
