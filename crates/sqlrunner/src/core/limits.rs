use std::borrow::Cow;

use super::types::Limits;

/// Caps a read-only statement at `max_rows` by appending a `LIMIT` clause.
///
/// Statements already mentioning `limit` anywhere (case-insensitive substring,
/// not a parse) are returned untouched, whatever bound they carry. Trailing
/// terminators are stripped before the clause is appended.
pub fn apply_row_limit(sql: &str, max_rows: usize) -> Cow<'_, str> {
    let trimmed = sql.trim();
    if trimmed.to_ascii_lowercase().contains("limit") {
        return Cow::Borrowed(trimmed);
    }
    let body = trimmed.trim_end_matches(';');
    Cow::Owned(format!("{body} LIMIT {max_rows}"))
}

/// Resolves a caller-supplied row count, falling back to the configured default.
/// The caller's count is honoured as given.
pub fn effective_limit(requested: Option<usize>, default_rows: usize) -> Limits {
    Limits {
        max_rows: requested.unwrap_or(default_rows),
    }
}
