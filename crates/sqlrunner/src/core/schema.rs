use rusqlite::{Connection, Row};

use crate::core::{
    query::row_to_json_object,
    types::{ColumnDescriptor, TableDetail},
};
use crate::error::{AppError, AppResult};

/// User tables, in catalog order. Internal `sqlite_`-prefixed objects are skipped.
pub fn list_tables(conn: &Connection) -> AppResult<Vec<String>> {
    let mut stmt = conn.prepare(
        r"SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite\_%' ESCAPE '\'",
    )?;
    let rows = stmt
        .query_map([], |r| r.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn list_columns(conn: &Connection, table: &str) -> AppResult<Vec<ColumnDescriptor>> {
    // The table-valued form takes the name as a bound parameter, so no
    // identifier ever reaches the statement text.
    let mut stmt = conn.prepare(
        "SELECT cid, name, type, \"notnull\", dflt_value, pk FROM pragma_table_info(?1)",
    )?;
    let cols = stmt
        .query_map([table], |row: &Row<'_>| {
            Ok(ColumnDescriptor {
                cid: row.get("cid")?,
                name: row.get("name")?,
                decl_type: row.get::<_, Option<String>>("type")?.unwrap_or_default(),
                notnull: row.get::<_, i64>("notnull")? != 0,
                dflt_value: row.get("dflt_value")?,
                pk: row.get::<_, i64>("pk")? != 0,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(cols)
}

/// Column metadata plus up to `sample_limit` rows of `table`.
///
/// SQLite reports an unknown table as an empty column list rather than an
/// error, so an empty list is what signals `TableNotFound`.
pub fn table_detail(conn: &Connection, table: &str, sample_limit: usize) -> AppResult<TableDetail> {
    let schema = list_columns(conn, table)?;
    if schema.is_empty() {
        return Err(AppError::TableNotFound(table.to_string()));
    }

    let sql = format!("SELECT * FROM {} LIMIT ?1", quote_identifier(table));
    let mut stmt = conn.prepare(&sql)?;
    let col_names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
    let limit = i64::try_from(sample_limit).unwrap_or(i64::MAX);

    let mut samples = Vec::new();
    let mut r = stmt.query([limit])?;
    while let Some(row) = r.next()? {
        samples.push(row_to_json_object(row, &col_names)?);
    }

    Ok(TableDetail { schema, samples })
}

pub(crate) fn quote_identifier(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}
