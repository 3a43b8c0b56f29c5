use base64::{engine::general_purpose::STANDARD, Engine as _};
use rusqlite::{types::ValueRef, Batch, Connection, Row, Statement};

use crate::core::{
    limits::apply_row_limit,
    readonly::is_read_only,
    types::{DbRow, ExecResult, ExecuteOutcome, QueryResult},
};
use crate::error::{AppError, AppResult};

pub const MULTIPLE_STATEMENTS: &str = "You can only execute one statement at a time.";

/// Runs one statement. Read-only statements are capped at `max_rows` (unless
/// they already carry a LIMIT) and return their rows; anything else is
/// executed to completion and committed.
pub fn execute_statement(conn: &Connection, sql: &str, max_rows: usize) -> AppResult<ExecuteOutcome> {
    if sql.trim().trim_end_matches(';').trim().is_empty() {
        return Ok(ExecuteOutcome::Changes(ExecResult::default()));
    }

    if is_read_only(sql) {
        let limited = apply_row_limit(sql, max_rows);
        tracing::debug!(sql = %limited, "running read-only statement");
        run_query(conn, &limited).map(ExecuteOutcome::Rows)
    } else {
        tracing::debug!(sql = %sql.trim(), "running write statement");
        run_execute(conn, sql.trim()).map(ExecuteOutcome::Changes)
    }
}

pub fn run_query(conn: &Connection, sql: &str) -> AppResult<QueryResult> {
    let Some(mut stmt) = prepare_single(conn, sql)? else {
        return Ok(QueryResult::default());
    };
    let columns: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();

    let mut rows = Vec::new();
    let mut r = stmt.query([])?;
    while let Some(row) = r.next()? {
        rows.push(row_to_json_object(row, &columns)?);
    }

    Ok(QueryResult { columns, rows })
}

pub fn run_execute(conn: &Connection, sql: &str) -> AppResult<ExecResult> {
    let before = total_changes(conn)?;
    {
        // Step through instead of `execute` so statements that yield rows
        // (RETURNING, some pragmas) still run to completion.
        if let Some(mut stmt) = prepare_single(conn, sql)? {
            let mut rows = stmt.query([])?;
            while rows.next()?.is_some() {}
        }
    }

    // A caller-issued BEGIN leaves the connection mid-transaction.
    if !conn.is_autocommit() {
        conn.execute_batch("COMMIT")?;
    }

    let changes = total_changes(conn)? - before;
    let last_id = conn.last_insert_rowid();
    Ok(ExecResult {
        changes: changes.max(0) as u64,
        last_insert_rowid: (last_id != 0).then_some(last_id),
    })
}

/// Prepares the only statement in `sql`. `prepare` alone would silently drop
/// anything after the first statement, so the tail is checked here; trailing
/// terminators and comments are fine. `None` means there was no statement.
fn prepare_single<'conn>(conn: &'conn Connection, sql: &str) -> AppResult<Option<Statement<'conn>>> {
    let mut batch = Batch::new(conn, sql);
    let Some(stmt) = batch.next()? else {
        return Ok(None);
    };
    // An error preparing the tail still means there was a tail.
    match batch.next() {
        Ok(None) => Ok(Some(stmt)),
        Ok(Some(_)) | Err(_) => Err(AppError::SqlError(MULTIPLE_STATEMENTS.into())),
    }
}

// `changes()` survives DDL, so measure the delta instead.
fn total_changes(conn: &Connection) -> AppResult<i64> {
    Ok(conn.query_row("SELECT total_changes()", [], |r| r.get(0))?)
}

pub fn row_to_json_object(row: &Row<'_>, col_names: &[String]) -> AppResult<DbRow> {
    let mut out = DbRow::with_capacity(col_names.len());
    for (i, name) in col_names.iter().enumerate() {
        let v = match row.get_ref(i)? {
            ValueRef::Null => serde_json::Value::Null,
            ValueRef::Integer(x) => serde_json::Value::from(x),
            ValueRef::Real(x) => serde_json::Value::from(x),
            ValueRef::Text(t) => serde_json::Value::from(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => serde_json::json!({
                "$type": "blob",
                "base64": STANDARD.encode(b),
                "size": b.len()
            }),
        };
        // Duplicate column names keep the first value.
        out.entry(name.clone()).or_insert(v);
    }
    Ok(out)
}
