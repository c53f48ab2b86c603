//! Microsoft SQL Server dialect (spec §4.8): bracket identifiers, named
//! `@p{i}` parameters, and no native array type — array/jsonb operators,
//! including `json_has_key`, are unsupported rather than emulated with
//! fragile `OPENJSON` gymnastics.

use super::{helpers, LikeEscapeStyle, RegexSupport, SqlDialect};
use crate::schema::FieldType;

#[derive(Debug, Clone, Copy)]
pub struct Mssql;

impl SqlDialect for Mssql {
    fn name(&self) -> &'static str {
        "mssql"
    }

    fn quote_part(&self, part: &str) -> String {
        helpers::quote_bracket(part)
    }

    fn placeholder(&self, index: usize) -> String {
        format!("@p{index}")
    }

    fn regex_support(&self) -> RegexSupport {
        RegexSupport::Unsupported
    }

    fn like_escape_style(&self) -> LikeEscapeStyle {
        LikeEscapeStyle::Bracket
    }

    fn date_cast(&self, expr: &str) -> String {
        format!("CAST({expr} AS DATE)")
    }

    fn extract_part(&self, unit: &str, expr: &str) -> String {
        format!("DATEPART({unit}, {expr})")
    }

    fn cast_json_path(&self, path: &str, field_type: FieldType) -> String {
        match field_type {
            FieldType::Number | FieldType::Decimal => format!("CAST({path} AS DECIMAL(38,10))"),
            FieldType::Integer => format!("CAST({path} AS BIGINT)"),
            FieldType::Boolean => format!("CAST({path} AS BIT)"),
            FieldType::Date => format!("CAST({path} AS DATE)"),
            FieldType::Datetime | FieldType::Timestamp => format!("CAST({path} AS DATETIME2)"),
            _ => path.to_string(),
        }
    }

    // No array or JSON operator overrides: MSSQL only supports `in`/`not_in`
    // on these field types (the trait defaults); every JSON operator,
    // including `json_has_key`, fails `UnsupportedOperator` (spec §4.8
    // "Array operators (MSSQL, SQLite)").
}
