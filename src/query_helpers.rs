//! Schema-aware SELECT/ORDER BY/pagination fragment builders (spec §6,
//! Component H). These complement [`crate::compiler::compile`]'s WHERE
//! fragment so a host can assemble a full statement without hand-quoting
//! identifiers itself.

use serde_json::Value;

use crate::dialect::Dialect;
use crate::error::{RuleSqlError, SchemaValidationError};
use crate::schema::{FieldSource, Schema};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn keyword(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

fn resolve_column(schema: &Schema, dialect: Dialect, field_name: &str) -> Result<String, RuleSqlError> {
    let field = schema
        .field(field_name)
        .ok_or_else(|| SchemaValidationError::UnknownField(field_name.to_string()))?;
    let source = field.resolved_source(field_name);
    Ok(match &source {
        FieldSource::Column { column } => {
            crate::sanitize::check_identifier(column)?;
            dialect.dialect().quote_identifier(column)
        }
        FieldSource::JsonPath { json_path } => dialect.dialect().cast_json_path(json_path, field.field_type),
        FieldSource::Computed { expression, .. } => expression.clone(),
    })
}

/// Build a `SELECT <cols>` fragment for the given selectable fields,
/// aliasing each column to its declared field name.
pub fn build_select(schema: &Schema, dialect: Dialect, fields: &[String]) -> Result<String, RuleSqlError> {
    if fields.is_empty() {
        return Ok("SELECT *".to_string());
    }
    let mut columns = Vec::with_capacity(fields.len());
    for name in fields {
        let field = schema
            .field(name)
            .ok_or_else(|| SchemaValidationError::UnknownField(name.to_string()))?;
        if !field.selectable {
            return Err(SchemaValidationError::NotFilterable(name.clone()).into());
        }
        let column = resolve_column(schema, dialect, name)?;
        let alias = dialect.dialect().quote_part(name);
        columns.push(format!("{column} AS {alias}"));
    }
    Ok(format!("SELECT {}", columns.join(", ")))
}

/// Build an `ORDER BY` fragment from an ordered list of `(field, direction)`
/// pairs. Every field must be declared `sortable` (spec §3).
pub fn build_sort(schema: &Schema, dialect: Dialect, sort: &[(String, SortDirection)]) -> Result<String, RuleSqlError> {
    if sort.is_empty() {
        return Ok(String::new());
    }
    let mut parts = Vec::with_capacity(sort.len());
    for (name, direction) in sort {
        let field = schema
            .field(name)
            .ok_or_else(|| SchemaValidationError::UnknownField(name.clone()))?;
        if !field.sortable {
            return Err(SchemaValidationError::NotFilterable(name.clone()).into());
        }
        let column = resolve_column(schema, dialect, name)?;
        parts.push(format!("{column} {}", direction.keyword()));
    }
    Ok(format!("ORDER BY {}", parts.join(", ")))
}

/// `page`/`page_size` is converted to `offset = (page - 1) * page_size`,
/// `limit = page_size` before `max_page_size` clamping; `offset`/`limit` is
/// used as given (spec §6 "build_pagination").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationInput {
    Page { page: u64, page_size: u64 },
    OffsetLimit { offset: u64, limit: u64 },
}

/// Placeholder token family, independent of the active [`Dialect`] (spec §6
/// "placeholder_style" — a proxy that remaps placeholders may need a style
/// other than its driver's dialect default).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    Dollar,
    Question,
    At,
}

impl PlaceholderStyle {
    fn for_dialect(dialect: Dialect) -> Self {
        match dialect {
            Dialect::Postgres => PlaceholderStyle::Dollar,
            Dialect::MySql | Dialect::Sqlite => PlaceholderStyle::Question,
            Dialect::Mssql => PlaceholderStyle::At,
        }
    }

    fn render(self, index: usize) -> String {
        match self {
            PlaceholderStyle::Dollar => format!("${index}"),
            PlaceholderStyle::Question => "?".to_string(),
            PlaceholderStyle::At => format!("@p{index}"),
        }
    }
}

/// A `LIMIT`/`OFFSET` fragment plus its two bound parameters, registered
/// starting at `start_index` so a caller can append them after a WHERE
/// clause's own parameters without colliding indices.
#[derive(Debug, Clone, PartialEq)]
pub struct Pagination {
    pub sql: String,
    /// Bound values in the same left-to-right order as their placeholders
    /// appear in `sql`.
    pub params: Vec<Value>,
    pub next_param_index: usize,
}

/// Build a parameterized `LIMIT`/`OFFSET` fragment. MSSQL requires an
/// `ORDER BY` before `OFFSET ... FETCH` and uses that syntax instead of
/// `LIMIT` (spec §6). `max_page_size` clamps the effective page size/limit;
/// `start_index` is the first placeholder index to use, mirroring
/// [`crate::context::CompileContext::register_param`]'s numbering so the
/// caller can continue a shared parameter sequence.
pub fn build_pagination(
    dialect: Dialect,
    input: PaginationInput,
    max_page_size: Option<u64>,
    start_index: usize,
    placeholder_style: Option<PlaceholderStyle>,
) -> Pagination {
    let (offset, limit) = match input {
        PaginationInput::Page { page, page_size } => {
            let page_size = clamp_max(page_size, max_page_size);
            let page = page.max(1);
            ((page - 1) * page_size, page_size)
        }
        PaginationInput::OffsetLimit { offset, limit } => (offset, clamp_max(limit, max_page_size)),
    };

    let style = placeholder_style.unwrap_or_else(|| PlaceholderStyle::for_dialect(dialect));

    let (sql, params) = match dialect {
        Dialect::Mssql => {
            let offset_ph = style.render(start_index);
            let limit_ph = style.render(start_index + 1);
            (
                format!("OFFSET {offset_ph} ROWS FETCH NEXT {limit_ph} ROWS ONLY"),
                vec![Value::from(offset), Value::from(limit)],
            )
        }
        _ => {
            let limit_ph = style.render(start_index);
            let offset_ph = style.render(start_index + 1);
            (
                format!("LIMIT {limit_ph} OFFSET {offset_ph}"),
                vec![Value::from(limit), Value::from(offset)],
            )
        }
    };

    Pagination {
        sql,
        params,
        next_param_index: start_index + 2,
    }
}

fn clamp_max(value: u64, max: Option<u64>) -> u64 {
    match max {
        Some(max) => value.min(max),
        None => value,
    }
}
