/// Classifies a statement as read-only when its first whitespace-delimited
/// token is `select`, case-insensitively.
///
/// This is a keyword heuristic, not a parse: a leading comment or a
/// parenthesised query is classified as a write, and anything after the first
/// token is not inspected.
pub fn is_read_only(sql: &str) -> bool {
    sql.split_whitespace()
        .next()
        .is_some_and(|first| first.eq_ignore_ascii_case("select"))
}
