//! MySQL dialect (spec §4.8): backtick identifiers, `?` placeholders, and
//! `JSON_*` functions standing in for both array and jsonb fields, since
//! MySQL has no native array type.

use serde_json::Value;

use super::{helpers, LikeEscapeStyle, RegexSupport, SqlDialect};
use crate::context::CompileContext;
use crate::error::{RuleSqlError, UnsupportedOperator};
use crate::operator::Operator;
use crate::schema::FieldType;

#[derive(Debug, Clone, Copy)]
pub struct MySql;

impl SqlDialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_part(&self, part: &str) -> String {
        helpers::quote_backtick(part)
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
        format!("CAST({expr} AS DATE)")
    }

    fn extract_part(&self, unit: &str, expr: &str) -> String {
        format!("EXTRACT({unit} FROM {expr})")
    }

    fn cast_json_path(&self, path: &str, field_type: FieldType) -> String {
        match field_type {
            FieldType::Number | FieldType::Decimal => format!("CAST({path} AS DECIMAL)"),
            FieldType::Integer => format!("CAST({path} AS SIGNED)"),
            FieldType::Boolean => format!("CAST({path} AS UNSIGNED)"),
            FieldType::Date | FieldType::Datetime | FieldType::Timestamp => {
                format!("CAST({path} AS DATETIME)")
            }
            _ => path.to_string(),
        }
    }

    fn array_op(
        &self,
        column: &str,
        op: Operator,
        value: Value,
        field_type: FieldType,
        ctx: &mut CompileContext,
    ) -> Result<String, RuleSqlError> {
        match op {
            // `array`/`jsonb` fields are both stored as a MySQL `JSON`
            // column; `contains` goes through `JSON_CONTAINS`. Every other
            // array operator has no MySQL equivalent and fails
            // `UnsupportedOperator` (spec §4.8 "Array operators (MySQL)").
            Operator::Contains => {
                let p = ctx.register_param(value);
                Ok(format!("JSON_CONTAINS({column}, {})", self.placeholder(p.index)))
            }
            other => Err(UnsupportedOperator {
                dialect: self.name(),
                operator: other.token().to_string(),
                field_type: if field_type.is_array_like() { "array" } else { "jsonb" },
            }
            .into()),
        }
    }

    fn json_op(
        &self,
        column: &str,
        op: Operator,
        value: Value,
        ctx: &mut CompileContext,
    ) -> Result<String, RuleSqlError> {
        match op {
            Operator::JsonContains => {
                let p = ctx.register_param(value);
                Ok(format!("JSON_CONTAINS({column}, {})", self.placeholder(p.index)))
            }
            Operator::JsonHasKey => {
                let key = value.as_str().unwrap_or_default();
                let p = ctx.register_param(Value::String(format!("$.{key}")));
                Ok(format!("JSON_CONTAINS_PATH({column}, 'one', {})", self.placeholder(p.index)))
            }
            Operator::JsonHasAnyKeys => {
                let keys = value.as_array().cloned().unwrap_or_default();
                let placeholders: Vec<String> = keys
                    .into_iter()
                    .map(|k| {
                        let path = format!("$.{}", k.as_str().unwrap_or_default());
                        let p = ctx.register_param(Value::String(path));
                        self.placeholder(p.index)
                    })
                    .collect();
                Ok(format!(
                    "JSON_CONTAINS_PATH({column}, 'one', {})",
                    placeholders.join(", ")
                ))
            }
            other => Err(UnsupportedOperator {
                dialect: self.name(),
                operator: other.token().to_string(),
                field_type: "jsonb",
            }
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_with_backticks() {
        assert_eq!(MySql.quote_identifier("a.b"), "`a`.`b`");
    }

    #[test]
    fn placeholder_is_always_question_mark() {
        assert_eq!(MySql.placeholder(1), "?");
        assert_eq!(MySql.placeholder(9), "?");
    }

    #[test]
    fn contains_uses_json_contains() {
        let mut ctx = CompileContext::new(5, 100);
        let sql = MySql
            .array_op("`tags`", Operator::Contains, Value::from("x"), FieldType::Array, &mut ctx)
            .unwrap();
        assert_eq!(sql, "JSON_CONTAINS(`tags`, ?)");
    }

    #[test]
    fn json_has_key_uses_contains_path() {
        let mut ctx = CompileContext::new(5, 100);
        let sql = MySql
            .json_op("`meta`", Operator::JsonHasKey, Value::from("role"), &mut ctx)
            .unwrap();
        assert_eq!(sql, "JSON_CONTAINS_PATH(`meta`, 'one', ?)");
        assert_eq!(ctx.params().get("p1"), Some(&Value::from("$.role")));
    }
}
