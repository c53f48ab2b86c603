//! PostgreSQL dialect (spec §4.8): the richest target — native arrays,
//! `jsonb` containment operators, `ILIKE`, and POSIX regex matching.

use serde_json::Value;

use super::{helpers, LikeEscapeStyle, RegexSupport, SqlDialect};
use crate::context::CompileContext;
use crate::error::{RuleSqlError, UnsupportedOperator};
use crate::operator::Operator;
use crate::schema::FieldType;

#[derive(Debug, Clone, Copy)]
pub struct Postgres;

/// `jsonb`-typed fields have no native array operators, so `contains`/
/// `contained_by` go through a `::jsonb` cast and `overlaps`/`any_of`/
/// `not_any_of` walk the document's elements via `jsonb_array_elements_text`
/// (spec §4.8 "Array operators (PostgreSQL)").
fn jsonb_array_op(
    dialect: &Postgres,
    column: &str,
    op: Operator,
    value: Value,
    ctx: &mut CompileContext,
) -> Result<String, RuleSqlError> {
    match op {
        Operator::Contains | Operator::ContainedBy => {
            let keyword = if matches!(op, Operator::Contains) { "@>" } else { "<@" };
            let p = ctx.register_param(value);
            Ok(format!("{column} {keyword} {}::jsonb", dialect.placeholder(p.index)))
        }
        Operator::Overlaps | Operator::AnyOf | Operator::NotAnyOf => {
            let items = match value {
                Value::Array(items) => items,
                other => vec![other],
            };
            let placeholders: Vec<String> = items
                .into_iter()
                .map(|item| dialect.placeholder(ctx.register_param(item).index))
                .collect();
            let exists = format!(
                "EXISTS (SELECT 1 FROM jsonb_array_elements_text({column}) AS elem WHERE elem = ANY(ARRAY[{}]))",
                placeholders.join(", ")
            );
            Ok(if matches!(op, Operator::NotAnyOf) {
                format!("NOT {exists}")
            } else {
                exists
            })
        }
        other => Err(UnsupportedOperator {
            dialect: dialect.name(),
            operator: other.token().to_string(),
            field_type: "jsonb",
        }
        .into()),
    }
}

impl SqlDialect for Postgres {
    fn name(&self) -> &'static str {
        "postgresql"
    }

    fn quote_part(&self, part: &str) -> String {
        helpers::quote_double(part)
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${index}")
    }

    fn supports_ilike(&self) -> bool {
        true
    }

    fn regex_support(&self) -> RegexSupport {
        RegexSupport::PosixOperator
    }

    fn like_escape_style(&self) -> LikeEscapeStyle {
        LikeEscapeStyle::Backslash
    }

    fn date_cast(&self, expr: &str) -> String {
        format!("({expr})::date")
    }

    fn extract_part(&self, unit: &str, expr: &str) -> String {
        format!("EXTRACT({unit} FROM {expr})")
    }

    fn cast_json_path(&self, path: &str, field_type: FieldType) -> String {
        match field_type {
            FieldType::Number | FieldType::Decimal => format!("({path})::numeric"),
            FieldType::Integer => format!("({path})::bigint"),
            FieldType::Boolean => format!("({path})::boolean"),
            FieldType::Date => format!("({path})::date"),
            FieldType::Datetime | FieldType::Timestamp => format!("({path})::timestamp"),
            _ => path.to_string(),
        }
    }

    // `in`/`not_in` on `array` fields redirect to set-membership via
    // `= ANY(...)` rather than a scalar `IN (...)` list (spec §4.8).
    fn in_op(
        &self,
        column: &str,
        values: Vec<Value>,
        negated: bool,
        field_type: FieldType,
        ctx: &mut CompileContext,
    ) -> Result<String, RuleSqlError> {
        if field_type.is_array_like() {
            return self.array_op(
                column,
                if negated { Operator::NotAnyOf } else { Operator::AnyOf },
                Value::Array(values),
                field_type,
                ctx,
            );
        }
        Ok(super::in_scalar(self, column, values, negated, ctx))
    }

    fn array_op(
        &self,
        column: &str,
        op: Operator,
        value: Value,
        field_type: FieldType,
        ctx: &mut CompileContext,
    ) -> Result<String, RuleSqlError> {
        if field_type.is_json_like() {
            return jsonb_array_op(self, column, op, value, ctx);
        }
        match op {
            Operator::Contains | Operator::ContainedBy | Operator::Overlaps => {
                let keyword = match op {
                    Operator::Contains => "@>",
                    Operator::ContainedBy => "<@",
                    Operator::Overlaps => "&&",
                    _ => unreachable!(),
                };
                let p = ctx.register_param(value);
                Ok(format!("{column} {keyword} {}", self.placeholder(p.index)))
            }
            // The candidate value is the scalar operand; PostgreSQL's `ANY`/
            // `ALL` quantifiers take the array on the right, so the
            // placeholder is the left-hand operand (spec §4.8).
            Operator::AnyOf | Operator::NotAnyOf => {
                let p = ctx.register_param(value);
                let (cmp, quantifier) = if matches!(op, Operator::AnyOf) {
                    ("=", "ANY")
                } else {
                    ("<>", "ALL")
                };
                Ok(format!("{} {cmp} {quantifier}({column})", self.placeholder(p.index)))
            }
            Operator::AnyIlike | Operator::NotAnyIlike => {
                let p = ctx.register_param(value);
                let prefix = if matches!(op, Operator::NotAnyIlike) { "NOT " } else { "" };
                Ok(format!(
                    "{prefix}EXISTS (SELECT 1 FROM unnest({column}) AS x WHERE x ILIKE {})",
                    self.placeholder(p.index)
                ))
            }
            other => Err(UnsupportedOperator {
                dialect: self.name(),
                operator: other.token().to_string(),
                field_type: "array",
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
                Ok(format!("{column} @> {}", self.placeholder(p.index)))
            }
            Operator::JsonHasKey => {
                let p = ctx.register_param(value);
                Ok(format!("{column} ? {}", self.placeholder(p.index)))
            }
            Operator::JsonHasAnyKeys => {
                let p = ctx.register_param(value);
                Ok(format!("{column} ?| {}", self.placeholder(p.index)))
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
