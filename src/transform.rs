//! Value/column transform engine (spec §4.4, Component E).
//!
//! Transforms run in two modes against the same ordered step list: a
//! *column* transform wraps the SQL expression inside-out, and a *value*
//! transform mutates the bound parameter. Only text-only steps apply to
//! values; custom templates never do.

use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;
use crate::error::RuleSqlError;
use crate::schema::FieldType;

/// A single named transform step, or a custom SQL template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TransformStep {
    Named(NamedTransform),
    /// `{"template": "unaccent({column})"}` — `{column}` is replaced with
    /// the current expression. Never applied to values.
    Template { template: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamedTransform {
    Lower,
    Upper,
    Trim,
    Ltrim,
    Rtrim,
    Unaccent,
    Date,
    Year,
    Month,
    Day,
}

const COLUMN_PLACEHOLDER: &str = "{column}";

/// Wrap `expr` inside-out with each step in `steps`, e.g. `[lower, trim]`
/// produces `trim(lower(expr))`.
pub fn apply_column_transforms(
    expr: &str,
    steps: &[TransformStep],
    dialect: Dialect,
) -> Result<String, RuleSqlError> {
    let mut current = expr.to_string();
    for step in steps {
        current = apply_one_column_transform(&current, step, dialect)?;
    }
    Ok(current)
}

fn apply_one_column_transform(
    expr: &str,
    step: &TransformStep,
    dialect: Dialect,
) -> Result<String, RuleSqlError> {
    use NamedTransform::*;
    match step {
        TransformStep::Template { template } => Ok(template.replace(COLUMN_PLACEHOLDER, expr)),
        TransformStep::Named(named) => Ok(match named {
            Lower => format!("LOWER({expr})"),
            Upper => format!("UPPER({expr})"),
            Trim => format!("TRIM({expr})"),
            Ltrim => dialect.dialect().ltrim(expr),
            Rtrim => dialect.dialect().rtrim(expr),
            Date => dialect.dialect().date_cast(expr),
            Unaccent => {
                if dialect == Dialect::Postgres {
                    format!("unaccent({expr})")
                } else {
                    return Err(crate::error::UnsupportedOperator {
                        dialect: dialect.dialect().name(),
                        operator: "unaccent".to_string(),
                        field_type: "string",
                    }
                    .into());
                }
            }
            Year => dialect.dialect().extract_part("YEAR", expr),
            Month => dialect.dialect().extract_part("MONTH", expr),
            Day => dialect.dialect().extract_part("DAY", expr),
        }),
    }
}

/// Apply text-only value transforms to a scalar parameter value. Non-string
/// values and custom templates pass through untouched.
pub fn apply_value_transforms(value: serde_json::Value, steps: &[TransformStep]) -> serde_json::Value {
    let mut current = value;
    for step in steps {
        current = apply_one_value_transform(current, step);
    }
    current
}

fn apply_one_value_transform(value: serde_json::Value, step: &TransformStep) -> serde_json::Value {
    use NamedTransform::*;
    let TransformStep::Named(named) = step else {
        return value;
    };
    let serde_json::Value::String(s) = &value else {
        return value;
    };
    match named {
        Lower => serde_json::Value::String(s.to_lowercase()),
        Upper => serde_json::Value::String(s.to_uppercase()),
        Trim => serde_json::Value::String(s.trim().to_string()),
        Ltrim => serde_json::Value::String(s.trim_start().to_string()),
        Rtrim => serde_json::Value::String(s.trim_end().to_string()),
        _ => value,
    }
}

/// Whether a field's source permits column/value transforms at all — only
/// plain columns do; computed expressions and JSON paths are emitted
/// verbatim (spec §4.4).
pub fn transforms_apply_to(field_type: FieldType) -> bool {
    // Transforms are about string/date shaping; JSON/array fields route
    // their "transform" intent through casts and operator dispatch instead.
    !matches!(field_type, FieldType::Json | FieldType::Jsonb)
}
