//! `SELECT`/`ORDER BY`/pagination fragment builders.

use std::collections::HashSet;

use rulesql::query_helpers::{build_pagination, build_select, build_sort, PaginationInput, SortDirection};
use rulesql::schema::{Constraints, FieldSchema, FieldSource, FieldSourceOrDefault, FieldType, Schema, TransformSpec};
use rulesql::Dialect;

fn schema() -> Schema {
    let mut schema = Schema::new();
    schema.fields.insert(
        "status".to_string(),
        FieldSchema {
            field_type: FieldType::String,
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
    schema.fields.insert(
        "created_at".to_string(),
        FieldSchema {
            field_type: FieldType::Datetime,
            allowed_operators: HashSet::new(),
            source: FieldSourceOrDefault::Explicit(FieldSource::Column {
                column: "orders.created_at".to_string(),
            }),
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
    schema.fields.insert(
        "internal_score".to_string(),
        FieldSchema {
            field_type: FieldType::Number,
            allowed_operators: HashSet::new(),
            source: FieldSourceOrDefault::None {},
            filterable: true,
            selectable: false,
            sortable: false,
            nullable: false,
            case_sensitive: false,
            options: None,
            constraints: Constraints::default(),
            transform: TransformSpec::default(),
        },
    );
    schema
}

#[test]
fn select_defaults_to_star_when_no_fields_given() {
    assert_eq!(build_select(&schema(), Dialect::Postgres, &[]).unwrap(), "SELECT *");
}

#[test]
fn select_quotes_and_aliases_qualified_columns() {
    let sql = build_select(&schema(), Dialect::Postgres, &["created_at".to_string()]).unwrap();
    assert_eq!(sql, "SELECT \"orders\".\"created_at\" AS \"created_at\"");
}

#[test]
fn select_rejects_non_selectable_field() {
    assert!(build_select(&schema(), Dialect::Postgres, &["internal_score".to_string()]).is_err());
}

#[test]
fn sort_builds_multi_key_order_by() {
    let sql = build_sort(
        &schema(),
        Dialect::Postgres,
        &[
            ("status".to_string(), SortDirection::Asc),
            ("created_at".to_string(), SortDirection::Desc),
        ],
    )
    .unwrap();
    assert_eq!(sql, "ORDER BY \"status\" ASC, \"orders\".\"created_at\" DESC");
}

#[test]
fn sort_rejects_non_sortable_field() {
    assert!(build_sort(&schema(), Dialect::Postgres, &[("internal_score".to_string(), SortDirection::Asc)]).is_err());
}

#[test]
fn pagination_binds_limit_and_offset_as_parameters() {
    let page = build_pagination(
        Dialect::Postgres,
        PaginationInput::OffsetLimit { offset: 10, limit: 20 },
        None,
        1,
        None,
    );
    assert_eq!(page.sql, "LIMIT $1 OFFSET $2");
    assert_eq!(page.params, vec![serde_json::json!(20), serde_json::json!(10)]);
    assert_eq!(page.next_param_index, 3);
}

#[test]
fn mssql_pagination_uses_offset_fetch_next() {
    let page = build_pagination(
        Dialect::Mssql,
        PaginationInput::OffsetLimit { offset: 5, limit: 10 },
        None,
        1,
        None,
    );
    assert_eq!(page.sql, "OFFSET @p1 ROWS FETCH NEXT @p2 ROWS ONLY");
}

#[test]
fn max_page_size_caps_a_page_size_request() {
    let page = build_pagination(
        Dialect::Postgres,
        PaginationInput::Page { page: 2, page_size: 1000 },
        Some(50),
        1,
        None,
    );
    assert_eq!(page.params, vec![serde_json::json!(50), serde_json::json!(50)]);
}
