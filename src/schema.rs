//! The field schema: the in-memory contract every rule is validated against
//! before any SQL is emitted (spec §3 "Field schema").

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::InvalidIdentifier;
use crate::transform::TransformStep;

/// Logical field type. Drives type checking (validator) and cast/dispatch
/// decisions (dialect layer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Text,
    Number,
    Integer,
    Decimal,
    Boolean,
    Date,
    Datetime,
    Timestamp,
    Uuid,
    Array,
    Json,
    Jsonb,
}

impl FieldType {
    pub fn is_array_like(&self) -> bool {
        matches!(self, FieldType::Array)
    }

    pub fn is_json_like(&self) -> bool {
        matches!(self, FieldType::Json | FieldType::Jsonb)
    }

    pub fn is_date_like(&self) -> bool {
        matches!(self, FieldType::Date | FieldType::Datetime | FieldType::Timestamp)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Number | FieldType::Integer | FieldType::Decimal)
    }
}

/// How a field's reference is emitted as a column expression (spec §4.7).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldSource {
    /// A physical identifier, optionally qualified `schema.table.column`
    /// (≤3 dot-separated parts).
    Column { column: String },
    /// A raw SQL expression reaching into a JSON document, emitted verbatim
    /// (optionally cast, spec §4.7).
    JsonPath { json_path: String },
    /// A raw SQL expression substituted as the field reference, read-only.
    Computed { computed: bool, expression: String },
}

/// Enumerated value set for a field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Options {
    pub values: Vec<Value>,
    #[serde(default)]
    pub strict: bool,
}

/// Per-type value constraints (spec §3 "constraints").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Constraints {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<String>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
    pub date_format: Option<String>,
    pub min_date: Option<String>,
    pub max_date: Option<String>,
    /// Name of a predicate registered in the compiling [`Schema`]'s
    /// [`ValidatorRegistry`]; stored as an opaque string since a
    /// `serde`-modeled schema cannot carry a Rust closure across a
    /// deserialization boundary. A name with no registered predicate is
    /// logged and treated as passing (spec §4.3).
    pub validate: Option<String>,
}

/// A predicate a host registers under a name referenced by
/// [`Constraints::validate`]; `Ok(())` passes, `Err(reason)` fails with
/// `reason` surfaced on [`crate::error::SchemaValidationError::CustomValidationFailed`].
pub type CustomValidator = fn(&Value) -> std::result::Result<(), String>;

/// Host-supplied custom predicates, looked up by the name in
/// `constraints.validate`. Not part of the schema's JSON representation —
/// populate it on the deserialized [`Schema`] before calling
/// [`crate::compiler::compile`].
#[derive(Debug, Clone, Default)]
pub struct ValidatorRegistry(HashMap<String, CustomValidator>);

impl ValidatorRegistry {
    pub fn register(&mut self, name: impl Into<String>, predicate: CustomValidator) {
        self.0.insert(name.into(), predicate);
    }

    pub fn get(&self, name: &str) -> Option<CustomValidator> {
        self.0.get(name).copied()
    }
}

/// Ordered list of value/column transforms applied on ingest/egress
/// (spec §4.4).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransformSpec {
    #[serde(default)]
    pub input: Vec<TransformStep>,
    #[serde(default)]
    pub output: Vec<TransformStep>,
}

/// A single declared field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSchema {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub allowed_operators: HashSet<String>,
    #[serde(flatten)]
    pub source: FieldSourceOrDefault,
    #[serde(default = "default_true")]
    pub filterable: bool,
    #[serde(default = "default_true")]
    pub selectable: bool,
    #[serde(default = "default_true")]
    pub sortable: bool,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub case_sensitive: bool,
    pub options: Option<Options>,
    #[serde(default)]
    pub constraints: Constraints,
    #[serde(default)]
    pub transform: TransformSpec,
}

/// `source` is optional in user-authored schema JSON: a field with no
/// `column`/`json_path`/`computed` falls back to its own field name as a
/// plain column, the common case.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldSourceOrDefault {
    Explicit(FieldSource),
    None {},
}

fn default_true() -> bool {
    true
}

impl FieldSchema {
    /// The column expression source, defaulting to the field's own name.
    pub fn resolved_source<'a>(&'a self, field_name: &'a str) -> FieldSource {
        match &self.source {
            FieldSourceOrDefault::Explicit(s) => s.clone(),
            FieldSourceOrDefault::None {} => FieldSource::Column {
                column: field_name.to_string(),
            },
        }
    }
}

/// Depth/condition caps, overridable per-schema (spec §4.6, §6).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_max_conditions")]
    pub max_conditions: usize,
}

fn default_max_depth() -> usize {
    5
}

fn default_max_conditions() -> usize {
    100
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            max_depth: default_max_depth(),
            max_conditions: default_max_conditions(),
        }
    }
}

/// The full field schema a [`crate::compiler::Compiler`] validates against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    pub fields: HashMap<String, FieldSchema>,
    #[serde(default)]
    pub settings: Settings,
    /// Custom validation predicates, registered programmatically after
    /// loading the schema's JSON; never part of the serialized form.
    #[serde(skip)]
    pub validators: ValidatorRegistry,
}

/// Schema construction/self-validation errors (spec §10 "Schema::validate_self").
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SchemaError {
    #[error("field '{0}': {1}")]
    InvalidIdentifier(String, InvalidIdentifier),

    #[error("field '{field}': options.strict is true but options.values is empty")]
    EmptyStrictOptions { field: String },
}

impl Schema {
    pub fn new() -> Self {
        Schema {
            fields: HashMap::new(),
            settings: Settings::default(),
            validators: ValidatorRegistry::default(),
        }
    }

    /// Look up a declared field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.get(name)
    }

    /// Parse a schema from its JSON representation (spec §10).
    pub fn from_json(value: &Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value.clone())
    }

    /// Validate the schema itself: every declared `column`/`json_path`
    /// segment is a legal identifier, and `options.strict` never pairs with
    /// an empty value set. Catches authoring mistakes at load time instead
    /// of deferring them to the first `compile()` call (spec §10).
    pub fn validate_self(&self) -> Result<(), SchemaError> {
        for (name, field) in &self.fields {
            if let FieldSourceOrDefault::Explicit(FieldSource::Column { column }) = &field.source {
                crate::sanitize::check_identifier(column)
                    .map_err(|e| SchemaError::InvalidIdentifier(name.clone(), e))?;
            }
            if let Some(opts) = &field.options {
                if opts.strict && opts.values.is_empty() {
                    return Err(SchemaError::EmptyStrictOptions { field: name.clone() });
                }
            }
        }
        Ok(())
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}
