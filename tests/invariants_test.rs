//! Structural invariants the compiler must hold regardless of dialect or
//! schema shape: parameter ordering, depth/condition limits, determinism.

use std::collections::HashSet;

use serde_json::json;

use rulesql::error::{CompilerError, RuleSqlError};
use rulesql::schema::{FieldSchema, FieldSourceOrDefault, FieldType, Schema, Settings};
use rulesql::{compile, Dialect};

fn schema_with_settings(max_depth: usize, max_conditions: usize) -> Schema {
    let mut schema = Schema::new();
    schema.settings = Settings { max_depth, max_conditions };
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
            constraints: Default::default(),
            transform: Default::default(),
        },
    );
    schema
}

#[test]
fn parameter_positions_match_placeholder_order() {
    let schema = schema_with_settings(5, 100);
    let rule = json!({"between": [{"var": "x"}, 1, 100]});
    let out = compile(&schema, Dialect::Postgres, &rule).unwrap();
    assert_eq!(out.sql, "\"x\" BETWEEN $1 AND $2");
    assert_eq!(out.params_array, vec![json!(1), json!(100)]);
    assert_eq!(out.params.get("p1"), Some(&json!(1)));
    assert_eq!(out.params.get("p2"), Some(&json!(100)));
    assert_eq!(out.params_array[0], out.params["p1"]);
    assert_eq!(out.params_array[1], out.params["p2"]);
}

#[test]
fn parameter_indices_are_strictly_monotonic_and_never_reused() {
    let schema = schema_with_settings(5, 100);
    let rule = json!({
        "and": [
            {"==": [{"var": "x"}, 1]},
            {"==": [{"var": "x"}, 2]},
            {"==": [{"var": "x"}, 3]}
        ]
    });
    let out = compile(&schema, Dialect::Postgres, &rule).unwrap();
    assert_eq!(out.sql, "(\"x\" = $1 AND \"x\" = $2 AND \"x\" = $3)");
    assert_eq!(out.params_array, vec![json!(1), json!(2), json!(3)]);
}

#[test]
fn compiling_the_same_rule_twice_is_deterministic() {
    let schema = schema_with_settings(5, 100);
    let rule = json!({"==": [{"var": "x"}, 7]});
    let first = compile(&schema, Dialect::Postgres, &rule).unwrap();
    let second = compile(&schema, Dialect::Postgres, &rule).unwrap();
    assert_eq!(first, second);
}

#[test]
fn nesting_deeper_than_max_depth_is_rejected() {
    let schema = schema_with_settings(2, 100);
    let rule = json!({"and": [{"or": [{"and": [{"==": [{"var": "x"}, 1]}]}]}]});
    let err = compile(&schema, Dialect::Postgres, &rule).unwrap_err();
    assert!(matches!(err, RuleSqlError::Compiler(CompilerError::MaxDepthExceeded { .. })));
}

#[test]
fn exceeding_max_conditions_is_rejected() {
    let schema = schema_with_settings(10, 2);
    let rule = json!({
        "and": [
            {"==": [{"var": "x"}, 1]},
            {"==": [{"var": "x"}, 2]},
            {"==": [{"var": "x"}, 3]}
        ]
    });
    let err = compile(&schema, Dialect::Postgres, &rule).unwrap_err();
    assert!(matches!(
        err,
        RuleSqlError::Compiler(CompilerError::MaxConditionsExceeded { .. })
    ));
}

#[test]
fn condition_object_must_have_exactly_one_key() {
    let schema = schema_with_settings(5, 100);
    let rule = json!({"==": [{"var": "x"}, 1], "!=": [{"var": "x"}, 2]});
    let err = compile(&schema, Dialect::Postgres, &rule).unwrap_err();
    assert!(matches!(err, RuleSqlError::Compiler(CompilerError::WrongArity(2))));
}

#[test]
fn unknown_operator_token_is_rejected() {
    let schema = schema_with_settings(5, 100);
    let rule = json!({"xor": [{"var": "x"}, 1]});
    let err = compile(&schema, Dialect::Postgres, &rule).unwrap_err();
    assert!(matches!(err, RuleSqlError::Compiler(CompilerError::UnknownOperator(_))));
}

#[test]
fn compiled_sql_never_embeds_literal_operand_values() {
    let schema = schema_with_settings(5, 100);
    let rule = json!({"==": [{"var": "x"}, 424242]});
    let out = compile(&schema, Dialect::Postgres, &rule).unwrap();
    assert!(!out.sql.contains("424242"));
    assert_eq!(out.params_array, vec![json!(424242)]);
}
