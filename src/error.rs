//! Error taxonomy for the compiler.
//!
//! Each pipeline stage owns a narrow, specific error enum (mirroring the
//! per-module `thiserror` enums a larger service crate would declare for its
//! own stages); [`RuleSqlError`] composes them via `#[from]` so callers that
//! just want "did this compile" can match on one type, while code that wants
//! to distinguish a malformed rule from a rejected value still can.

use thiserror::Error;

/// Structural errors: malformed rule shape, unknown operator, bad arity,
/// nesting/condition caps exceeded.
#[derive(Debug, Error, PartialEq)]
pub enum CompilerError {
    #[error("rule must be a JSON object")]
    NotAnObject,

    #[error("condition object must have exactly one key, found {0}")]
    WrongArity(usize),

    #[error("unknown operator token: {0}")]
    UnknownOperator(String),

    #[error("operator '{operator}' requires a field reference operand")]
    MissingFieldReference { operator: String },

    #[error("operator '{operator}' requires {expected} operand(s), found {found}")]
    WrongOperandCount {
        operator: String,
        expected: &'static str,
        found: usize,
    },

    #[error("nesting depth {depth} exceeds max_depth {max_depth}")]
    MaxDepthExceeded { depth: usize, max_depth: usize },

    #[error("condition count {count} exceeds max_conditions {max_conditions}")]
    MaxConditionsExceeded { count: usize, max_conditions: usize },

    #[error("'{variant}' operand must be an array of sub-rules")]
    ExpectedArray { variant: &'static str },

    #[error("field reference must be a non-empty string")]
    InvalidFieldReference,
}

/// Schema-directed validation errors: unknown/non-filterable field, operator
/// not allowed, type/options/constraint/null violations.
#[derive(Debug, Error, PartialEq)]
pub enum SchemaValidationError {
    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("field '{0}' is not filterable")]
    NotFilterable(String),

    #[error("operator '{operator}' is not allowed on field '{field}'; allowed operators: {allowed}")]
    OperatorNotAllowed {
        field: String,
        operator: String,
        allowed: String,
    },

    #[error("field '{field}' does not allow null values")]
    NullNotAllowed { field: String },

    #[error("value for field '{field}' is not one of the allowed options: {allowed}")]
    NotInOptions { field: String, allowed: String },

    #[error("field '{field}' expected a {expected} value, got {found}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("field '{field}' value length {len} is below min_length {min}")]
    MinLength { field: String, len: usize, min: usize },

    #[error("field '{field}' value length {len} exceeds max_length {max}")]
    MaxLength { field: String, len: usize, max: usize },

    #[error("field '{field}' value does not match pattern {pattern}")]
    PatternMismatch { field: String, pattern: String },

    #[error("field '{field}' value {value} is below min {min}")]
    BelowMin { field: String, value: String, min: String },

    #[error("field '{field}' value {value} exceeds max {max}")]
    AboveMax { field: String, value: String, max: String },

    #[error("field '{field}' expects an integer value, got {value}")]
    NotAnInteger { field: String, value: String },

    #[error("field '{field}' value is not a valid UUID: {value}")]
    InvalidUuid { field: String, value: String },

    #[error("field '{field}' value is not a valid {kind}: {value}")]
    InvalidDate {
        field: String,
        kind: &'static str,
        value: String,
    },

    #[error("field '{field}' date {value} is before min_date {min}")]
    DateBeforeMin { field: String, value: String, min: String },

    #[error("field '{field}' date {value} is after max_date {max}")]
    DateAfterMax { field: String, value: String, max: String },

    #[error("field '{field}' array has {len} items, below min_items {min}")]
    TooFewItems { field: String, len: usize, min: usize },

    #[error("field '{field}' array has {len} items, exceeds max_items {max}")]
    TooManyItems { field: String, len: usize, max: usize },

    #[error("field '{field}' failed custom validation: {reason}")]
    CustomValidationFailed { field: String, reason: String },

    #[error("operator '{operator}' on field '{field}' requires exactly two values for BETWEEN-style ranges")]
    MissingOperand { field: String, operator: String },
}

/// An identifier token failed the `[A-Za-z_][A-Za-z0-9_]*` lexical grammar.
#[derive(Debug, Error, PartialEq)]
#[error("invalid identifier: {0}")]
pub struct InvalidIdentifier(pub String);

/// A rule tree contains a reference cycle (shared mutable subtree revisited
/// on the same DFS path), or was otherwise structurally unsafe to sanitize.
#[derive(Debug, Error, PartialEq)]
pub enum InputIntegrityError {
    #[error("circular reference detected while sanitizing rule tree")]
    CircularReference,

    #[error("rule is empty after removing disallowed keys")]
    InvalidInput,
}

/// A parameter value could not be bound: it embeds a NUL byte, or a
/// non-string value reached a pattern check that requires a string.
#[derive(Debug, Error, PartialEq)]
pub enum InvalidParameter {
    #[error("parameter value contains an embedded NUL byte")]
    EmbeddedNul,

    #[error("pattern constraint on field '{field}' requires a string value")]
    PatternRequiresString { field: String },
}

/// A requested operator/field-type combination has no emission strategy on
/// the active dialect.
#[derive(Debug, Error, PartialEq)]
#[error("operator '{operator}' is not supported on dialect '{dialect}' for field type {field_type}")]
pub struct UnsupportedOperator {
    pub dialect: &'static str,
    pub operator: String,
    pub field_type: &'static str,
}

/// Top-level error returned by [`crate::compiler::compile`].
///
/// Compilation is terminal: the first error encountered aborts the walk and
/// is returned here. No partial SQL or parameter state is exposed.
#[derive(Debug, Error, PartialEq)]
pub enum RuleSqlError {
    #[error(transparent)]
    Compiler(#[from] CompilerError),

    #[error(transparent)]
    Schema(#[from] SchemaValidationError),

    #[error(transparent)]
    Identifier(#[from] InvalidIdentifier),

    #[error(transparent)]
    InputIntegrity(#[from] InputIntegrityError),

    #[error(transparent)]
    Parameter(#[from] InvalidParameter),

    #[error(transparent)]
    Unsupported(#[from] UnsupportedOperator),
}

pub type Result<T> = std::result::Result<T, RuleSqlError>;
