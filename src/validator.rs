//! Schema-directed validation (spec §4.3-§4.4, Component C): every condition
//! is checked against its field's declared type, allowed operators, options,
//! and constraints before any SQL is considered.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::error::{InvalidParameter, RuleSqlError, SchemaValidationError};
use crate::operator::Operator;
use crate::schema::{Constraints, FieldSchema, FieldType, Schema, ValidatorRegistry};

/// Look up a field and confirm it accepts filter conditions (spec invariant 2).
pub fn resolve_field<'a>(schema: &'a Schema, name: &str) -> Result<&'a FieldSchema, SchemaValidationError> {
    let field = schema
        .field(name)
        .ok_or_else(|| SchemaValidationError::UnknownField(name.to_string()))?;
    if !field.filterable {
        return Err(SchemaValidationError::NotFilterable(name.to_string()));
    }
    Ok(field)
}

/// Confirm `operator` appears in the field's allowed-operator allowlist, if
/// one was declared. An empty allowlist means "no restriction."
pub fn check_operator(
    field_name: &str,
    field: &FieldSchema,
    operator: Operator,
) -> Result<(), SchemaValidationError> {
    if field.allowed_operators.is_empty() {
        return Ok(());
    }
    if field.allowed_operators.contains(operator.token()) {
        return Ok(());
    }
    let mut allowed: Vec<&str> = field.allowed_operators.iter().map(String::as_str).collect();
    allowed.sort_unstable();
    Err(SchemaValidationError::OperatorNotAllowed {
        field: field_name.to_string(),
        operator: operator.token().to_string(),
        allowed: allowed.join(", "),
    })
}

/// Validate every operand of a condition against the field's type, options,
/// and constraints. `null` is special-cased: it bypasses type/option/
/// constraint checks entirely and is instead governed by `field.nullable`.
pub fn check_values(
    field_name: &str,
    field: &FieldSchema,
    operator: Operator,
    values: &[Value],
    validators: &ValidatorRegistry,
) -> Result<(), RuleSqlError> {
    if operator.is_unary() {
        return Ok(());
    }

    // `any_of`/`not_any_of`/`any_ilike`/`not_any_ilike` compare a scalar
    // candidate against an array column's elements, whose element type the
    // schema does not separately declare, so the element-type check is
    // skipped for them (spec §4.3).
    let bypasses_element_check = field.field_type.is_array_like()
        && matches!(
            operator,
            Operator::AnyOf | Operator::NotAnyOf | Operator::AnyIlike | Operator::NotAnyIlike
        );

    let is_list_operand = operator.is_set_valued();
    let elementwise = is_list_operand || (operator == Operator::Contains && field.field_type.is_array_like());

    for value in values {
        if bypasses_element_check {
            continue;
        }
        if elementwise {
            let items = value.as_array().cloned().unwrap_or_else(|| vec![value.clone()]);
            for item in &items {
                check_one_value(field_name, field, &item_type_for_array(field.field_type), item, validators)?;
            }
            if is_list_operand {
                check_array_size(field_name, &field.constraints, &items)?;
            }
        } else {
            check_one_value(field_name, field, &field.field_type, value, validators)?;
        }
    }
    Ok(())
}

/// Array fields validate each element against their declared element type;
/// everything else validates the operand directly against its own type.
fn item_type_for_array(field_type: FieldType) -> FieldType {
    if field_type.is_array_like() {
        FieldType::String
    } else {
        field_type
    }
}

fn check_one_value(
    field_name: &str,
    field: &FieldSchema,
    value_type: &FieldType,
    value: &Value,
    validators: &ValidatorRegistry,
) -> Result<(), RuleSqlError> {
    if value.is_null() {
        if !field.nullable {
            return Err(SchemaValidationError::NullNotAllowed {
                field: field_name.to_string(),
            }
            .into());
        }
        return Ok(());
    }

    crate::sanitize::check_no_embedded_nul(value)?;
    check_type(field_name, value_type, value)?;
    check_options(field_name, field, value)?;
    check_constraints(field_name, &field.constraints, *value_type, value, validators)?;
    Ok(())
}

fn check_type(field_name: &str, field_type: &FieldType, value: &Value) -> Result<(), SchemaValidationError> {
    let ok = match field_type {
        FieldType::String | FieldType::Text | FieldType::Uuid | FieldType::Date | FieldType::Datetime | FieldType::Timestamp => {
            value.is_string()
        }
        FieldType::Number | FieldType::Decimal => value.is_number(),
        FieldType::Integer => value.is_i64() || value.is_u64(),
        FieldType::Boolean => value.is_boolean(),
        FieldType::Array => value.is_array(),
        FieldType::Json | FieldType::Jsonb => true,
    };
    if ok {
        Ok(())
    } else {
        Err(SchemaValidationError::TypeMismatch {
            field: field_name.to_string(),
            expected: type_name(*field_type),
            found: json_type_name(value),
        })
    }
}

fn type_name(field_type: FieldType) -> &'static str {
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

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn check_options(field_name: &str, field: &FieldSchema, value: &Value) -> Result<(), SchemaValidationError> {
    let Some(options) = &field.options else {
        return Ok(());
    };
    if !options.strict {
        return Ok(());
    }
    if options.values.iter().any(|v| v == value) {
        return Ok(());
    }
    Err(SchemaValidationError::NotInOptions {
        field: field_name.to_string(),
        allowed: options
            .values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", "),
    })
}

static DATE_FORMATS: Lazy<[(&str, &str); 3]> = Lazy::new(|| {
    [
        ("date", "%Y-%m-%d"),
        ("datetime", "%Y-%m-%dT%H:%M:%S"),
        ("timestamp", "%Y-%m-%dT%H:%M:%S%.f"),
    ]
});

fn default_format_for(field_type: FieldType) -> &'static str {
    let key = match field_type {
        FieldType::Date => "date",
        FieldType::Datetime => "datetime",
        _ => "timestamp",
    };
    DATE_FORMATS.iter().find(|(k, _)| *k == key).map(|(_, f)| *f).unwrap()
}

/// A spec-documented `date_format` name (§4.3): a fixed anchored regex that
/// decides validity, plus, where the format carries a full calendar date, a
/// chrono strptime string used to derive a [`NaiveDate`] for `min_date`/
/// `max_date` bounds. Time-only formats (`HH:mm`, `HH:mm:ss`) have no date to
/// derive, so bounds checking is skipped for them.
struct NamedDateFormat {
    regex: Regex,
    chrono_format: Option<&'static str>,
}

static NAMED_DATE_FORMATS: Lazy<Vec<(&'static str, NamedDateFormat)>> = Lazy::new(|| {
    let spec = |pattern: &str, chrono_format: Option<&'static str>| NamedDateFormat {
        regex: Regex::new(pattern).expect("named date format regex is a fixed literal"),
        chrono_format,
    };
    vec![
        (
            "iso",
            spec(
                r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:\d{2})?$",
                Some("%Y-%m-%dT%H:%M:%S"),
            ),
        ),
        ("date-only", spec(r"^\d{4}-\d{2}-\d{2}$", Some("%Y-%m-%d"))),
        (
            "datetime",
            spec(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}$", Some("%Y-%m-%dT%H:%M:%S")),
        ),
        ("YYYY-MM-DD", spec(r"^\d{4}-\d{2}-\d{2}$", Some("%Y-%m-%d"))),
        ("YYYY/MM/DD", spec(r"^\d{4}/\d{2}/\d{2}$", Some("%Y/%m/%d"))),
        ("DD-MM-YYYY", spec(r"^\d{2}-\d{2}-\d{4}$", Some("%d-%m-%Y"))),
        ("DD/MM/YYYY", spec(r"^\d{2}/\d{2}/\d{4}$", Some("%d/%m/%Y"))),
        ("DD.MM.YYYY", spec(r"^\d{2}\.\d{2}\.\d{4}$", Some("%d.%m.%Y"))),
        ("MM-DD-YYYY", spec(r"^\d{2}-\d{2}-\d{4}$", Some("%m-%d-%Y"))),
        ("MM/DD/YYYY", spec(r"^\d{2}/\d{2}/\d{4}$", Some("%m/%d/%Y"))),
        ("HH:mm", spec(r"^\d{2}:\d{2}$", None)),
        ("HH:mm:ss", spec(r"^\d{2}:\d{2}:\d{2}$", None)),
    ]
});

fn named_date_format(name: &str) -> Option<&'static NamedDateFormat> {
    NAMED_DATE_FORMATS.iter().find(|(n, _)| *n == name).map(|(_, f)| f)
}

fn check_constraints(
    field_name: &str,
    constraints: &Constraints,
    field_type: FieldType,
    value: &Value,
    validators: &ValidatorRegistry,
) -> Result<(), RuleSqlError> {
    if let Some(name) = &constraints.validate {
        if let Some(predicate) = validators.get(name) {
            if let Err(reason) = predicate(value) {
                return Err(SchemaValidationError::CustomValidationFailed {
                    field: field_name.to_string(),
                    reason,
                }
                .into());
            }
        } else {
            warn!(field = field_name, validator = name, "custom validator name has no registered predicate");
        }
    }

    if let Value::String(s) = value {
        if let Some(min) = constraints.min_length {
            if s.chars().count() < min {
                return Err(SchemaValidationError::MinLength {
                    field: field_name.to_string(),
                    len: s.chars().count(),
                    min,
                }
                .into());
            }
        }
        if let Some(max) = constraints.max_length {
            if s.chars().count() > max {
                return Err(SchemaValidationError::MaxLength {
                    field: field_name.to_string(),
                    len: s.chars().count(),
                    max,
                }
                .into());
            }
        }
        if let Some(pattern) = &constraints.pattern {
            let re = Regex::new(pattern).map_err(|_| InvalidParameter::PatternRequiresString {
                field: field_name.to_string(),
            })?;
            if !re.is_match(s) {
                return Err(SchemaValidationError::PatternMismatch {
                    field: field_name.to_string(),
                    pattern: pattern.clone(),
                }
                .into());
            }
        }
        if field_type == FieldType::Uuid && Uuid::parse_str(s).is_err() {
            return Err(SchemaValidationError::InvalidUuid {
                field: field_name.to_string(),
                value: s.clone(),
            }
            .into());
        }
        if field_type.is_date_like() {
            check_date(field_name, constraints, field_type, s)?;
        }
    }

    if let Some(n) = value.as_f64() {
        if let Some(min) = constraints.min {
            if n < min {
                return Err(SchemaValidationError::BelowMin {
                    field: field_name.to_string(),
                    value: n.to_string(),
                    min: min.to_string(),
                }
                .into());
            }
        }
        if let Some(max) = constraints.max {
            if n > max {
                return Err(SchemaValidationError::AboveMax {
                    field: field_name.to_string(),
                    value: n.to_string(),
                    max: max.to_string(),
                }
                .into());
            }
        }
        if field_type == FieldType::Integer && n.fract() != 0.0 {
            return Err(SchemaValidationError::NotAnInteger {
                field: field_name.to_string(),
                value: n.to_string(),
            }
            .into());
        }
    }

    Ok(())
}

fn check_date(
    field_name: &str,
    constraints: &Constraints,
    field_type: FieldType,
    raw: &str,
) -> Result<(), SchemaValidationError> {
    let invalid = || SchemaValidationError::InvalidDate {
        field: field_name.to_string(),
        kind: type_name(field_type),
        value: raw.to_string(),
    };

    // A `date_format` naming one of the documented formats (spec §4.3) is
    // checked against its fixed anchored regex; anything else is taken as a
    // literal chrono strptime string, for hosts that need a shape the named
    // table doesn't cover.
    match constraints.date_format.as_deref().and_then(named_date_format) {
        Some(named) => {
            if !named.regex.is_match(raw) {
                return Err(invalid());
            }
            let Some(chrono_format) = named.chrono_format else {
                return Ok(());
            };
            match parse_date_or_datetime(raw, chrono_format) {
                Some(date) => check_date_bounds(field_name, constraints, raw, date, chrono_format),
                // Regex already confirmed the shape (e.g. an ISO offset
                // chrono can't strptime); bounds just can't be derived.
                None => Ok(()),
            }
        }
        None => {
            let format = constraints
                .date_format
                .as_deref()
                .unwrap_or_else(|| default_format_for(field_type));
            let date = parse_date_or_datetime(raw, format).ok_or_else(invalid)?;
            check_date_bounds(field_name, constraints, raw, date, format)
        }
    }
}

fn parse_date_or_datetime(raw: &str, format: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, format)
        .or_else(|_| chrono::NaiveDateTime::parse_from_str(raw, format).map(|dt| dt.date()))
        .ok()
}

fn check_date_bounds(
    field_name: &str,
    constraints: &Constraints,
    raw: &str,
    date: NaiveDate,
    format: &str,
) -> Result<(), SchemaValidationError> {
    if let Some(min) = &constraints.min_date {
        if let Some(min_date) = parse_date_or_datetime(min, format) {
            if date < min_date {
                return Err(SchemaValidationError::DateBeforeMin {
                    field: field_name.to_string(),
                    value: raw.to_string(),
                    min: min.clone(),
                });
            }
        }
    }
    if let Some(max) = &constraints.max_date {
        if let Some(max_date) = parse_date_or_datetime(max, format) {
            if date > max_date {
                return Err(SchemaValidationError::DateAfterMax {
                    field: field_name.to_string(),
                    value: raw.to_string(),
                    max: max.clone(),
                });
            }
        }
    }
    Ok(())
}

fn check_array_size(field_name: &str, constraints: &Constraints, items: &[Value]) -> Result<(), RuleSqlError> {
    if let Some(min) = constraints.min_items {
        if items.len() < min {
            return Err(SchemaValidationError::TooFewItems {
                field: field_name.to_string(),
                len: items.len(),
                min,
            }
            .into());
        }
    }
    if let Some(max) = constraints.max_items {
        if items.len() > max {
            return Err(SchemaValidationError::TooManyItems {
                field: field_name.to_string(),
                len: items.len(),
                max,
            }
            .into());
        }
    }
    Ok(())
}
