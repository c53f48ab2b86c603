//! Schema-directed validation failures, exercised through the public
//! `compile` entry point end to end.

use std::collections::HashSet;

use serde_json::json;

use rulesql::error::{RuleSqlError, SchemaValidationError};
use rulesql::schema::{Constraints, FieldSchema, FieldSourceOrDefault, FieldType, Options, Schema, TransformSpec};
use rulesql::{compile, Dialect};

fn base_field(field_type: FieldType) -> FieldSchema {
    FieldSchema {
        field_type,
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
    }
}

fn schema_with(name: &str, field: FieldSchema) -> Schema {
    let mut schema = Schema::new();
    schema.fields.insert(name.to_string(), field);
    schema
}

#[test]
fn rejects_unknown_field_reference() {
    let schema = Schema::new();
    let err = compile(&schema, Dialect::Postgres, &json!({"==": [{"var": "ghost"}, 1]})).unwrap_err();
    assert!(matches!(err, RuleSqlError::Schema(SchemaValidationError::UnknownField(f)) if f == "ghost"));
}

#[test]
fn rejects_condition_on_non_filterable_field() {
    let mut field = base_field(FieldType::String);
    field.filterable = false;
    let schema = schema_with("internal_note", field);
    let err = compile(&schema, Dialect::Postgres, &json!({"==": [{"var": "internal_note"}, "x"]})).unwrap_err();
    assert!(matches!(err, RuleSqlError::Schema(SchemaValidationError::NotFilterable(_))));
}

#[test]
fn rejects_operator_outside_allowlist() {
    let mut field = base_field(FieldType::String);
    field.allowed_operators = ["eq".to_string(), "ne".to_string()].into_iter().collect();
    let schema = schema_with("status", field);
    let err = compile(&schema, Dialect::Postgres, &json!({">": [{"var": "status"}, "x"]})).unwrap_err();
    assert!(matches!(
        err,
        RuleSqlError::Schema(SchemaValidationError::OperatorNotAllowed { .. })
    ));
}

#[test]
fn rejects_null_on_non_nullable_field() {
    let schema = schema_with("status", base_field(FieldType::String));
    let err = compile(&schema, Dialect::Postgres, &json!({"==": [{"var": "status"}, null]})).unwrap_err();
    assert!(matches!(
        err,
        RuleSqlError::Schema(SchemaValidationError::NullNotAllowed { .. })
    ));
}

#[test]
fn rejects_type_mismatched_value() {
    let schema = schema_with("age", base_field(FieldType::Integer));
    let err = compile(&schema, Dialect::Postgres, &json!({"==": [{"var": "age"}, "not-a-number"]})).unwrap_err();
    assert!(matches!(
        err,
        RuleSqlError::Schema(SchemaValidationError::TypeMismatch { .. })
    ));
}

#[test]
fn rejects_value_outside_strict_options() {
    let mut field = base_field(FieldType::String);
    field.options = Some(Options {
        values: vec![json!("draft"), json!("published")],
        strict: true,
    });
    let schema = schema_with("state", field);
    let err = compile(&schema, Dialect::Postgres, &json!({"==": [{"var": "state"}, "archived"]})).unwrap_err();
    assert!(matches!(
        err,
        RuleSqlError::Schema(SchemaValidationError::NotInOptions { .. })
    ));
}

#[test]
fn rejects_string_shorter_than_min_length() {
    let mut field = base_field(FieldType::String);
    field.constraints.min_length = Some(3);
    let schema = schema_with("code", field);
    let err = compile(&schema, Dialect::Postgres, &json!({"==": [{"var": "code"}, "ab"]})).unwrap_err();
    assert!(matches!(
        err,
        RuleSqlError::Schema(SchemaValidationError::MinLength { .. })
    ));
}

#[test]
fn rejects_number_outside_min_max_bounds() {
    let mut field = base_field(FieldType::Number);
    field.constraints.min = Some(0.0);
    field.constraints.max = Some(100.0);
    let schema = schema_with("score", field);
    let err = compile(&schema, Dialect::Postgres, &json!({"==": [{"var": "score"}, 150]})).unwrap_err();
    assert!(matches!(err, RuleSqlError::Schema(SchemaValidationError::AboveMax { .. })));
}

#[test]
fn rejects_malformed_uuid() {
    let schema = schema_with("id", base_field(FieldType::Uuid));
    let err = compile(&schema, Dialect::Postgres, &json!({"==": [{"var": "id"}, "abc"]})).unwrap_err();
    assert!(matches!(
        err,
        RuleSqlError::Schema(SchemaValidationError::InvalidUuid { .. })
    ));
}

#[test]
fn rejects_array_shorter_than_min_items() {
    let mut field = base_field(FieldType::String);
    field.constraints.min_items = Some(2);
    let schema = schema_with("status", field);
    let err = compile(&schema, Dialect::Postgres, &json!({"in": [{"var": "status"}, ["only-one"]]})).unwrap_err();
    assert!(matches!(
        err,
        RuleSqlError::Schema(SchemaValidationError::TooFewItems { .. })
    ));
}

#[test]
fn schema_self_validation_catches_bad_column_name() {
    let mut field = base_field(FieldType::String);
    field.source = FieldSourceOrDefault::Explicit(rulesql::schema::FieldSource::Column {
        column: "1; DROP TABLE users".to_string(),
    });
    let schema = schema_with("status", field);
    assert!(schema.validate_self().is_err());
}
