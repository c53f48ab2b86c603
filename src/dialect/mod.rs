//! SQL dialect definitions (Component F).
//!
//! A trait-based abstraction over the four target relational dialects. Each
//! dialect implements [`SqlDialect`] for identifier quoting, placeholder
//! style, and the emission strategy for every operator class (spec §4.8).
//! Shared ANSI-ish behavior lives in the trait's default methods; dialects
//! override only where their SQL actually differs, the same split the
//! teacher crate uses for its own (full-query) dialect trait.

mod helpers;
mod mysql;
mod postgres;
mod sqlite;
mod mssql;

pub use mysql::MySql;
pub use postgres::Postgres;
pub use sqlite::Sqlite;
pub use mssql::Mssql;

use serde_json::Value;

use crate::context::CompileContext;
use crate::error::{RuleSqlError, UnsupportedOperator};
use crate::operator::Operator;
use crate::schema::FieldType;

/// How strings wrapped for `starts_with`/`ends_with`/`contains` get their
/// `%` wildcards and backslash/bracket escaping for LIKE metacharacters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeEscapeStyle {
    Backslash,
    Bracket,
}

/// SQL dialect trait: identifier quoting, placeholder style, and the
/// per-operator-class SQL synthesis rules.
pub trait SqlDialect: std::fmt::Debug {
    fn name(&self) -> &'static str;

    /// Quote a single (already-validated) dot-segment.
    fn quote_part(&self, part: &str) -> String;

    /// Emitted placeholder token for parameter index `i` (spec §4.5):
    /// `$i` (PostgreSQL), `?` (MySQL/SQLite), `@p{i}` (MSSQL).
    fn placeholder(&self, index: usize) -> String;

    /// Whether this dialect has a native case-insensitive `ILIKE`.
    fn supports_ilike(&self) -> bool {
        false
    }

    /// Whether this dialect supports the `regex` operator, and how.
    fn regex_support(&self) -> RegexSupport {
        RegexSupport::Unsupported
    }

    fn like_escape_style(&self) -> LikeEscapeStyle {
        LikeEscapeStyle::Backslash
    }

    // ------------------------------------------------------------------
    // Transform engine hooks (spec §4.4)
    // ------------------------------------------------------------------

    fn ltrim(&self, expr: &str) -> String {
        format!("LTRIM({expr})")
    }

    fn rtrim(&self, expr: &str) -> String {
        format!("RTRIM({expr})")
    }

    fn date_cast(&self, expr: &str) -> String;

    fn extract_part(&self, unit: &str, expr: &str) -> String;

    /// Cast a JSON-path field reference to its declared logical type
    /// (spec §4.7). Text comparisons need no cast.
    fn cast_json_path(&self, path: &str, field_type: FieldType) -> String;

    // ------------------------------------------------------------------
    // Quoting
    // ------------------------------------------------------------------

    /// Quote a (validated) dotted identifier, one segment at a time.
    fn quote_identifier(&self, dotted: &str) -> String {
        dotted
            .split('.')
            .map(|part| self.quote_part(part))
            .collect::<Vec<_>>()
            .join(".")
    }

    // ------------------------------------------------------------------
    // Operator emitters
    // ------------------------------------------------------------------

    fn null_check(&self, column: &str, negated: bool) -> String {
        format!("{column} IS {}NULL", if negated { "NOT " } else { "" })
    }

    fn comparison(&self, column: &str, op: Operator, value: Value, ctx: &mut CompileContext) -> String {
        let p = ctx.register_param(value);
        format!("{column} {} {}", comparison_sql(op), self.placeholder(p.index))
    }

    fn between(
        &self,
        column: &str,
        low: Value,
        high: Value,
        negated: bool,
        ctx: &mut CompileContext,
    ) -> String {
        let p1 = ctx.register_param(low);
        let p2 = ctx.register_param(high);
        format!(
            "{column} {}BETWEEN {} AND {}",
            if negated { "NOT " } else { "" },
            self.placeholder(p1.index),
            self.placeholder(p2.index)
        )
    }

    /// `in`/`not_in` on a scalar field. PostgreSQL overrides this to
    /// redirect array/jsonb fields to `overlaps` semantics (spec §4.8).
    fn in_op(
        &self,
        column: &str,
        values: Vec<Value>,
        negated: bool,
        _field_type: FieldType,
        ctx: &mut CompileContext,
    ) -> Result<String, RuleSqlError> {
        Ok(in_scalar(self, column, values, negated, ctx))
    }

    /// `like`, `ilike`, `starts_with`, `ends_with`, `contains` (string
    /// semantics), `regex`.
    fn string_op(
        &self,
        column: &str,
        op: Operator,
        value: Value,
        case_sensitive: bool,
        ctx: &mut CompileContext,
    ) -> Result<String, RuleSqlError> {
        default_string_op(self, column, op, value, case_sensitive, ctx)
    }

    /// `contains`/`contained_by`/`overlaps`/`any_of`/`not_any_of`/
    /// `any_ilike`/`not_any_ilike` on array or jsonb fields.
    fn array_op(
        &self,
        _column: &str,
        op: Operator,
        _value: Value,
        field_type: FieldType,
        _ctx: &mut CompileContext,
    ) -> Result<String, RuleSqlError> {
        Err(UnsupportedOperator {
            dialect: self.name(),
            operator: op.token().to_string(),
            field_type: field_type_name(field_type),
        }
        .into())
    }

    /// `json_contains`/`json_has_key`/`json_has_any_keys`.
    fn json_op(
        &self,
        _column: &str,
        op: Operator,
        _value: Value,
        _ctx: &mut CompileContext,
    ) -> Result<String, RuleSqlError> {
        Err(UnsupportedOperator {
            dialect: self.name(),
            operator: op.token().to_string(),
            field_type: "jsonb",
        }
        .into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegexSupport {
    Unsupported,
    /// PostgreSQL: `~` / `~*`.
    PosixOperator,
    /// MySQL/SQLite: `REGEXP`.
    RegexpKeyword,
}

pub(crate) fn comparison_sql(op: Operator) -> &'static str {
    match op {
        Operator::Eq => "=",
        Operator::Ne => "<>",
        Operator::Gt => ">",
        Operator::Gte => ">=",
        Operator::Lt => "<",
        Operator::Lte => "<=",
        other => unreachable!("{other:?} is not a comparison operator"),
    }
}

fn field_type_name(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::String => "string",
        FieldType::Text => "text",
        FieldType::Number => "number",
        FieldType::Integer => "integer",
        FieldType::Decimal => "decimal",
        FieldType::Boolean => "boolean",
        FieldType::Date => "date",
        FieldType::Datetime => "datetime",
        FieldType::Timestamp => "timestamp",
        FieldType::Uuid => "uuid",
        FieldType::Array => "array",
        FieldType::Json => "json",
        FieldType::Jsonb => "jsonb",
    }
}

fn in_scalar(
    dialect: &(impl SqlDialect + ?Sized),
    column: &str,
    values: Vec<Value>,
    negated: bool,
    ctx: &mut CompileContext,
) -> String {
    if values.is_empty() {
        // Empty-set identities (spec invariant 5): `in []` -> 1=0, `not_in []` -> 1=1.
        return if negated { "1=1" } else { "1=0" }.to_string();
    }
    let placeholders: Vec<String> = values
        .into_iter()
        .map(|v| {
            let p = ctx.register_param(v);
            dialect.placeholder(p.index)
        })
        .collect();
    format!(
        "{column} {}IN ({})",
        if negated { "NOT " } else { "" },
        placeholders.join(", ")
    )
}

fn default_string_op(
    dialect: &(impl SqlDialect + ?Sized),
    column: &str,
    op: Operator,
    value: Value,
    case_sensitive: bool,
    ctx: &mut CompileContext,
) -> Result<String, RuleSqlError> {
    match op {
        Operator::Like => {
            let p = ctx.register_param(value);
            Ok(format!("{column} LIKE {}", dialect.placeholder(p.index)))
        }
        Operator::Ilike => {
            let keyword = if dialect.supports_ilike() { "ILIKE" } else { "LIKE" };
            let p = ctx.register_param(value);
            Ok(format!("{column} {keyword} {}", dialect.placeholder(p.index)))
        }
        Operator::StartsWith | Operator::EndsWith | Operator::Contains => {
            let raw = value.as_str().unwrap_or_default();
            let escaped = match dialect.like_escape_style() {
                LikeEscapeStyle::Backslash => helpers::escape_like_backslash(raw),
                LikeEscapeStyle::Bracket => helpers::escape_like_bracket(raw),
            };
            let pattern = match op {
                Operator::StartsWith => format!("{escaped}%"),
                Operator::EndsWith => format!("%{escaped}"),
                _ => format!("%{escaped}%"),
            };
            let keyword = if case_sensitive {
                "LIKE"
            } else if dialect.supports_ilike() {
                "ILIKE"
            } else {
                "LIKE"
            };
            let p = ctx.register_param(Value::String(pattern));
            Ok(format!("{column} {keyword} {}", dialect.placeholder(p.index)))
        }
        Operator::Regex => match dialect.regex_support() {
            RegexSupport::Unsupported => Err(UnsupportedOperator {
                dialect: dialect.name(),
                operator: op.token().to_string(),
                field_type: "string",
            }
            .into()),
            RegexSupport::PosixOperator => {
                let keyword = if case_sensitive { "~" } else { "~*" };
                let p = ctx.register_param(value);
                Ok(format!("{column} {keyword} {}", dialect.placeholder(p.index)))
            }
            RegexSupport::RegexpKeyword => {
                let p = ctx.register_param(value);
                Ok(format!("{column} REGEXP {}", dialect.placeholder(p.index)))
            }
        },
        other => unreachable!("{other:?} is not a string operator"),
    }
}

/// Supported SQL dialects (spec §1: PostgreSQL, MySQL, MSSQL, SQLite).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    #[serde(alias = "postgresql")]
    Postgres,
    #[serde(rename = "mysql")]
    MySql,
    #[serde(alias = "sqlserver")]
    Mssql,
    Sqlite,
}

impl Dialect {
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Dialect::Postgres => &Postgres,
            Dialect::MySql => &MySql,
            Dialect::Mssql => &Mssql,
            Dialect::Sqlite => &Sqlite,
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dialect().name())
    }
}
