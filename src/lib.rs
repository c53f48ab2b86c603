//! # rulesql
//!
//! Compiles JSON-Logic rule trees into parameterized, multi-dialect SQL
//! `WHERE` fragments.
//!
//! ## Pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │             Rule JSON (JSON-Logic subset)                │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [sanitize]
//! ┌─────────────────────────────────────────────────────────┐
//! │        Sanitized tree (stripped keys, no cycles)         │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [rule::parse]
//! ┌─────────────────────────────────────────────────────────┐
//! │                      Rule (AST)                          │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [validator, against Schema]
//! ┌─────────────────────────────────────────────────────────┐
//! │            Checked conditions (type/options/…)           │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [compiler::compile, dialect]
//! ┌─────────────────────────────────────────────────────────┐
//! │        Parameterized SQL fragment + ordered params       │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! `compile` is the crate's single entry point; everything else is exposed
//! so a host application can build schemas, inspect compiled output, or
//! assemble a full statement with [`query_helpers`].

pub mod compiler;
pub mod context;
pub mod dialect;
pub mod error;
pub mod operator;
pub mod query_helpers;
pub mod rule;
pub mod sanitize;
pub mod schema;
pub mod transform;
pub mod validator;

pub use compiler::{compile, CompiledQuery};
pub use dialect::Dialect;
pub use error::{Result, RuleSqlError};
pub use schema::Schema;

/// Re-exports for convenient `use rulesql::prelude::*;` usage.
pub mod prelude {
    pub use crate::compiler::{compile, CompiledQuery};
    pub use crate::dialect::{Dialect, SqlDialect};
    pub use crate::error::{Result, RuleSqlError};
    pub use crate::operator::Operator;
    pub use crate::query_helpers::{
        build_pagination, build_select, build_sort, Pagination, PaginationInput, PlaceholderStyle, SortDirection,
    };
    pub use crate::schema::{CustomValidator, FieldSchema, FieldSource, FieldType, Schema, ValidatorRegistry};
}
