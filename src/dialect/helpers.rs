//! Shared helper functions dialects compose to implement [`super::SqlDialect`]
//! with minimal duplication — escaping and quoting building blocks, grouped
//! the way the teacher's dialect helper module groups them.

/// Quote identifier with double quotes (ANSI style). Used by: PostgreSQL, SQLite.
pub fn quote_double(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote identifier with backticks. Used by: MySQL.
pub fn quote_backtick(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

/// Quote identifier with square brackets. Used by: MSSQL.
pub fn quote_bracket(ident: &str) -> String {
    format!("[{}]", ident.replace(']', "]]"))
}

/// Escape `%`, `_`, and `\` in a LIKE pattern fragment so a user-supplied
/// substring matches literally once `%` wildcards are added around it
/// (spec §4.8, invariant 9). Dialects that escape with backslash use this.
pub fn escape_like_backslash(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '%' => out.push_str("\\%"),
            '_' => out.push_str("\\_"),
            other => out.push(other),
        }
    }
    out
}

/// MSSQL escapes LIKE metacharacters with `[...]` bracket groups instead of
/// a backslash escape character.
pub fn escape_like_bracket(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '%' => out.push_str("[%]"),
            '_' => out.push_str("[_]"),
            '[' => out.push_str("[[]"),
            other => out.push(other),
        }
    }
    out
}
