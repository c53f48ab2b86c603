//! The compilation driver (spec §4.6-§4.7, Component G): walks a parsed
//! [`Rule`] tree and emits one parameterized SQL fragment.
//!
//! Compilation is terminal — the first error encountered anywhere in the
//! walk aborts it and is returned directly; no partial SQL is exposed.

use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::context::CompileContext;
use crate::dialect::Dialect;
use crate::error::{CompilerError, RuleSqlError};
use crate::operator::Operator;
use crate::rule::{Condition, Rule};
use crate::schema::{FieldSchema, FieldSource, Schema};
use crate::transform;
use crate::validator;

/// A compiled WHERE fragment plus its bind parameters (spec §6). `params` is
/// the `p1..pn`-keyed object form (spec invariant 1); `params_array` is the
/// same values in index order, `params_array[i-1] == params["p"+i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: serde_json::Map<String, Value>,
    pub params_array: Vec<Value>,
}

/// Compile a JSON-Logic rule tree into a dialect-specific parameterized
/// fragment (spec §1 top-level entry point).
#[instrument(skip(schema, rule_json), fields(dialect = %dialect))]
pub fn compile(schema: &Schema, dialect: Dialect, rule_json: &Value) -> Result<CompiledQuery, RuleSqlError> {
    let sanitized = crate::sanitize::sanitize_rule(rule_json)?;
    let rule = crate::rule::parse(&sanitized)?;

    let mut ctx = CompileContext::new(schema.settings.max_depth, schema.settings.max_conditions);
    let sql = match visit(&rule, schema, dialect, &mut ctx) {
        Ok(sql) => sql,
        Err(err) => {
            warn!(error = %err, "rule rejected during compilation");
            return Err(err);
        }
    };
    debug!(condition_count = ctx.condition_count, param_count = ctx.next_index() - 1, "compiled rule");
    let params = ctx.into_params();
    Ok(CompiledQuery {
        sql,
        params: params.as_object(),
        params_array: params.as_array(),
    })
}

fn visit(rule: &Rule, schema: &Schema, dialect: Dialect, ctx: &mut CompileContext) -> Result<String, RuleSqlError> {
    match rule {
        Rule::And(items) => visit_connective(items, "AND", "1=1", schema, dialect, ctx),
        Rule::Or(items) => visit_connective(items, "OR", "1=0", schema, dialect, ctx),
        Rule::Not(inner) => {
            let sql = visit(inner, schema, dialect, ctx)?;
            Ok(format!("NOT ({sql})"))
        }
        Rule::Condition(cond) => compile_condition(cond, schema, dialect, ctx),
    }
}

fn visit_connective(
    items: &[Rule],
    joiner: &str,
    empty_identity: &str,
    schema: &Schema,
    dialect: Dialect,
    ctx: &mut CompileContext,
) -> Result<String, RuleSqlError> {
    if items.is_empty() {
        return Ok(empty_identity.to_string());
    }
    ctx.depth += 1;
    if ctx.depth > ctx.max_depth {
        return Err(CompilerError::MaxDepthExceeded {
            depth: ctx.depth,
            max_depth: ctx.max_depth,
        }
        .into());
    }
    let mut parts = Vec::with_capacity(items.len());
    for item in items {
        parts.push(visit(item, schema, dialect, ctx)?);
    }
    ctx.depth -= 1;
    Ok(format!("({})", parts.join(&format!(" {joiner} "))))
}

fn compile_condition(
    cond: &Condition,
    schema: &Schema,
    dialect: Dialect,
    ctx: &mut CompileContext,
) -> Result<String, RuleSqlError> {
    ctx.condition_count += 1;
    if ctx.condition_count > ctx.max_conditions {
        return Err(CompilerError::MaxConditionsExceeded {
            count: ctx.condition_count,
            max_conditions: ctx.max_conditions,
        }
        .into());
    }

    let field = validator::resolve_field(schema, &cond.field)?;
    validator::check_operator(&cond.field, field, cond.operator)?;
    validator::check_values(&cond.field, field, cond.operator, &cond.values, &schema.validators)?;

    let column_expr = build_column_expression(&cond.field, field, dialect)?;

    ctx.with_field_type(field.field_type, |ctx| {
        dispatch_operator(&column_expr, cond.operator, &cond.values, field, dialect, ctx)
    })
}

/// Resolve a field's source into a SQL expression, applying the JSON-path
/// cast and any declared input (column-side) transforms (spec §4.4, §4.7).
fn build_column_expression(field_name: &str, field: &FieldSchema, dialect: Dialect) -> Result<String, RuleSqlError> {
    let source = field.resolved_source(field_name);
    let base = match &source {
        FieldSource::Column { column } => {
            crate::sanitize::check_identifier(column)?;
            dialect.dialect().quote_identifier(column)
        }
        FieldSource::JsonPath { json_path } => dialect.dialect().cast_json_path(json_path, field.field_type),
        FieldSource::Computed { expression, .. } => expression.clone(),
    };
    if transform::transforms_apply_to(field.field_type) {
        transform::apply_column_transforms(&base, &field.transform.input, dialect)
    } else {
        Ok(base)
    }
}

fn apply_output_transform(value: Value, field: &FieldSchema) -> Value {
    if transform::transforms_apply_to(field.field_type) {
        transform::apply_value_transforms(value, &field.transform.output)
    } else {
        value
    }
}

fn dispatch_operator(
    column: &str,
    operator: Operator,
    values: &[Value],
    field: &FieldSchema,
    dialect: Dialect,
    ctx: &mut CompileContext,
) -> Result<String, RuleSqlError> {
    let d = dialect.dialect();

    if operator.is_unary() {
        return Ok(d.null_check(column, operator == Operator::IsNotNull));
    }

    match operator {
        Operator::Eq | Operator::Ne => {
            let value = apply_output_transform(values[0].clone(), field);
            if value.is_null() {
                return Ok(d.null_check(column, operator == Operator::Ne));
            }
            Ok(d.comparison(column, operator, value, ctx))
        }
        Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte => {
            let value = apply_output_transform(values[0].clone(), field);
            Ok(d.comparison(column, operator, value, ctx))
        }
        Operator::Between | Operator::NotBetween => {
            let low = apply_output_transform(values[0].clone(), field);
            let high = apply_output_transform(values[1].clone(), field);
            Ok(d.between(column, low, high, operator == Operator::NotBetween, ctx))
        }
        Operator::In | Operator::NotIn => {
            let items = list_operand(&values[0], field);
            d.in_op(column, items, operator == Operator::NotIn, field.field_type, ctx)
        }
        Operator::Contains | Operator::ContainedBy | Operator::Overlaps => {
            if field.field_type.is_array_like() || field.field_type.is_json_like() {
                let value = output_transform_operand(&values[0], field);
                d.array_op(column, operator, value, field.field_type, ctx)
            } else if operator == Operator::Contains {
                // Plain string `contains` (substring match) on a textual field.
                d.string_op(column, operator, apply_output_transform(values[0].clone(), field), field.case_sensitive, ctx)
            } else {
                Err(crate::error::UnsupportedOperator {
                    dialect: d.name(),
                    operator: operator.token().to_string(),
                    field_type: "scalar",
                }
                .into())
            }
        }
        Operator::AnyOf | Operator::NotAnyOf | Operator::AnyIlike | Operator::NotAnyIlike => {
            let value = apply_output_transform(values[0].clone(), field);
            d.array_op(column, operator, value, field.field_type, ctx)
        }
        Operator::Like | Operator::Ilike | Operator::StartsWith | Operator::EndsWith | Operator::Regex => {
            let value = apply_output_transform(values[0].clone(), field);
            d.string_op(column, operator, value, field.case_sensitive, ctx)
        }
        Operator::JsonContains | Operator::JsonHasKey | Operator::JsonHasAnyKeys => {
            let value = output_transform_operand(&values[0], field);
            d.json_op(column, operator, value, ctx)
        }
        Operator::IsNull | Operator::IsNotNull | Operator::And | Operator::Or | Operator::Not => {
            unreachable!("logical/unary operators are handled before dispatch_operator")
        }
    }
}

/// `in`/`not_in`/`overlaps`/`contained_by` carry a single array-typed operand
/// holding the actual value list.
fn list_operand(value: &Value, field: &FieldSchema) -> Vec<Value> {
    value
        .as_array()
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .map(|v| apply_output_transform(v, field))
        .collect()
}

fn output_transform_operand(value: &Value, field: &FieldSchema) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .cloned()
                .map(|v| apply_output_transform(v, field))
                .collect(),
        ),
        other => apply_output_transform(other.clone(), field),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Constraints, FieldSourceOrDefault, FieldType, Options, TransformSpec};
    use serde_json::json;
    use std::collections::HashSet;

    fn schema_with(name: &str, field_type: FieldType, nullable: bool) -> Schema {
        let mut schema = Schema::new();
        schema.fields.insert(
            name.to_string(),
            FieldSchema {
                field_type,
                allowed_operators: HashSet::new(),
                source: FieldSourceOrDefault::None {},
                filterable: true,
                selectable: true,
                sortable: true,
                nullable,
                case_sensitive: false,
                options: None,
                constraints: Constraints::default(),
                transform: TransformSpec::default(),
            },
        );
        schema
    }

    #[test]
    fn compiles_simple_equality() {
        let schema = schema_with("status", FieldType::String, false);
        let rule = json!({"==": [{"var": "status"}, "active"]});
        let out = compile(&schema, Dialect::Postgres, &rule).unwrap();
        assert_eq!(out.sql, "\"status\" = $1");
        assert_eq!(out.params_array, vec![json!("active")]);
    }

    #[test]
    fn compiles_and_or_not_nesting() {
        let mut schema = schema_with("status", FieldType::String, false);
        schema.fields.insert(
            "age".to_string(),
            FieldSchema {
                field_type: FieldType::Integer,
                allowed_operators: HashSet::new(),
                source: FieldSourceOrDefault::None {},
                filterable: true,
                selectable: true,
                sortable: true,
                nullable: false,
                case_sensitive: false,
                options: None,
                constraints: Constraints::default(),
                transform: TransformSpec::default(),
            },
        );
        let rule = json!({
            "and": [
                {"==": [{"var": "status"}, "active"]},
                {"!": {">": [{"var": "age"}, 18]}}
            ]
        });
        let out = compile(&schema, Dialect::MySql, &rule).unwrap();
        assert_eq!(out.sql, "(`status` = ? AND NOT (`age` > ?))");
        assert_eq!(out.params_array, vec![json!("active"), json!(18)]);
    }

    #[test]
    fn null_equality_rewrites_to_is_null() {
        let schema = schema_with("deleted_at", FieldType::Datetime, true);
        let rule = json!({"==": [{"var": "deleted_at"}, null]});
        let out = compile(&schema, Dialect::Postgres, &rule).unwrap();
        assert_eq!(out.sql, "\"deleted_at\" IS NULL");
        assert!(out.params_array.is_empty());
    }

    #[test]
    fn empty_and_or_use_identity_values() {
        let schema = Schema::new();
        assert_eq!(compile(&schema, Dialect::Postgres, &json!({"and": []})).unwrap().sql, "1=1");
        assert_eq!(compile(&schema, Dialect::Postgres, &json!({"or": []})).unwrap().sql, "1=0");
    }

    #[test]
    fn unknown_field_is_rejected() {
        let schema = Schema::new();
        let rule = json!({"==": [{"var": "ghost"}, 1]});
        let err = compile(&schema, Dialect::Postgres, &rule).unwrap_err();
        assert!(matches!(
            err,
            RuleSqlError::Schema(crate::error::SchemaValidationError::UnknownField(_))
        ));
    }

    #[test]
    fn max_depth_is_enforced() {
        let mut schema = Schema::new();
        schema.settings.max_depth = 1;
        schema.fields.insert(
            "x".to_string(),
            FieldSchema {
                field_type: FieldType::Integer,
                allowed_operators: HashSet::new(),
                source: FieldSourceOrDefault::None {},
                filterable: true,
                selectable: true,
                sortable: true,
                nullable: false,
                case_sensitive: false,
                options: None,
                constraints: Constraints::default(),
                transform: TransformSpec::default(),
            },
        );
        let rule = json!({"and": [{"or": [{"==": [{"var": "x"}, 1]}]}]});
        let err = compile(&schema, Dialect::Postgres, &rule).unwrap_err();
        assert!(matches!(
            err,
            RuleSqlError::Compiler(crate::error::CompilerError::MaxDepthExceeded { .. })
        ));
    }

    #[test]
    fn in_operator_produces_ordered_placeholders() {
        let schema = schema_with("status", FieldType::String, false);
        let rule = json!({"in": [{"var": "status"}, ["a", "b", "c"]]});
        let out = compile(&schema, Dialect::Postgres, &rule).unwrap();
        assert_eq!(out.sql, "\"status\" IN ($1, $2, $3)");
        assert_eq!(out.params_array, vec![json!("a"), json!("b"), json!("c")]);
    }

    #[test]
    fn options_validation_rejects_value_outside_allowed_set() {
        let mut schema = schema_with("status", FieldType::String, false);
        schema.fields.get_mut("status").unwrap().options = Some(Options {
            values: vec![json!("active"), json!("inactive")],
            strict: true,
        });
        let rule = json!({"==": [{"var": "status"}, "bogus"]});
        assert!(compile(&schema, Dialect::Postgres, &rule).is_err());
    }
}
