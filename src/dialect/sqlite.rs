//! SQLite dialect (spec §4.8): ANSI-style double-quoted identifiers and `?`
//! placeholders. Array/jsonb fields only get `in`/`not_in` (the trait
//! defaults); every other array or JSON operator is `UnsupportedOperator`.
//! `REGEXP` requires the host application to register a custom function —
//! unlike MySQL, SQLite does not ship one built in.

use serde_json::Value;

use super::{helpers, LikeEscapeStyle, RegexSupport, SqlDialect};
use crate::context::CompileContext;
use crate::error::RuleSqlError;
use crate::operator::Operator;
use crate::schema::FieldType;

#[derive(Debug, Clone, Copy)]
pub struct Sqlite;

impl SqlDialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_part(&self, part: &str) -> String {
        helpers::quote_double(part)
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn regex_support(&self) -> RegexSupport {
        RegexSupport::RegexpKeyword
    }

    fn like_escape_style(&self) -> LikeEscapeStyle {
        LikeEscapeStyle::Backslash
    }

    fn date_cast(&self, expr: &str) -> String {
        format!("date({expr})")
    }

    fn extract_part(&self, unit: &str, expr: &str) -> String {
        let format_code = match unit {
            "YEAR" => "%Y",
            "MONTH" => "%m",
            "DAY" => "%d",
            other => other,
        };
        format!("CAST(strftime('{format_code}', {expr}) AS INTEGER)")
    }

    fn cast_json_path(&self, path: &str, field_type: FieldType) -> String {
        match field_type {
            FieldType::Number | FieldType::Decimal => format!("CAST({path} AS REAL)"),
            FieldType::Integer => format!("CAST({path} AS INTEGER)"),
            FieldType::Date | FieldType::Datetime | FieldType::Timestamp => {
                format!("CAST({path} AS TEXT)")
            }
            _ => path.to_string(),
        }
    }

    // Escaped LIKE patterns need an explicit `ESCAPE` clause in SQLite,
    // unlike MySQL/PostgreSQL where `\` is the implicit default.
    fn string_op(
        &self,
        column: &str,
        op: Operator,
        value: Value,
        case_sensitive: bool,
        ctx: &mut CompileContext,
    ) -> Result<String, RuleSqlError> {
        let needs_escape_clause = matches!(
            op,
            Operator::StartsWith | Operator::EndsWith | Operator::Contains
        );
        let sql = super::default_string_op(self, column, op, value, case_sensitive, ctx)?;
        Ok(if needs_escape_clause {
            format!("{sql} ESCAPE '\\'")
        } else {
            sql
        })
    }

    // No array or JSON operator overrides: SQLite only supports `in`/`not_in`
    // on these field types (the trait defaults), everything else fails
    // `UnsupportedOperator` (spec §4.8 "Array operators (MSSQL, SQLite)").
}
