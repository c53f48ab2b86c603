//! The rule tree AST (spec §3 "Rule", Component B).
//!
//! Parsed once from a sanitized [`serde_json::Value`] into a typed tree so
//! the rest of the compiler never re-inspects raw JSON shape.

use serde_json::Value;

use crate::error::CompilerError;
use crate::operator::Operator;

/// A parsed JSON-Logic rule node.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    And(Vec<Rule>),
    Or(Vec<Rule>),
    Not(Box<Rule>),
    Condition(Condition),
}

/// A single leaf condition: `{"op": [{"var": "field"}, ...operands]}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub operator: Operator,
    /// Zero operands for unary (`is_null`), one for most, two for
    /// `between`/`not_between`, or a single array value for set-valued ops.
    pub values: Vec<Value>,
}

/// Parse a sanitized rule tree into a [`Rule`] (spec §4.3).
pub fn parse(value: &Value) -> Result<Rule, CompilerError> {
    let obj = value.as_object().ok_or(CompilerError::NotAnObject)?;
    if obj.len() != 1 {
        return Err(CompilerError::WrongArity(obj.len()));
    }
    let (token, operand) = obj.iter().next().expect("len checked above");
    let operator = Operator::canonicalize(token)?;

    match operator {
        Operator::And => Ok(Rule::And(parse_sub_rules(operand, "and")?)),
        Operator::Or => Ok(Rule::Or(parse_sub_rules(operand, "or")?)),
        Operator::Not => Ok(Rule::Not(Box::new(parse_not_operand(operand)?))),
        other => parse_condition(other, operand).map(Rule::Condition),
    }
}

fn parse_sub_rules(operand: &Value, variant: &'static str) -> Result<Vec<Rule>, CompilerError> {
    let items = operand
        .as_array()
        .ok_or(CompilerError::ExpectedArray { variant })?;
    items.iter().map(parse).collect()
}

fn parse_not_operand(operand: &Value) -> Result<Rule, CompilerError> {
    // `{"!": {...}}` wraps a single sub-rule directly; `{"!": [{...}]}` is
    // also accepted for symmetry with `and`/`or`.
    match operand.as_array() {
        Some(items) if items.len() == 1 => parse(&items[0]),
        Some(items) => Err(CompilerError::WrongOperandCount {
            operator: "not".to_string(),
            expected: "1",
            found: items.len(),
        }),
        None => parse(operand),
    }
}

fn parse_condition(operator: Operator, operand: &Value) -> Result<Condition, CompilerError> {
    let token = operator.token().to_string();
    let items = operand
        .as_array()
        .ok_or_else(|| CompilerError::MissingFieldReference { operator: token.clone() })?;

    let field_ref = items
        .first()
        .ok_or_else(|| CompilerError::MissingFieldReference { operator: token.clone() })?;
    let field = field_ref
        .as_object()
        .and_then(|o| o.get("var"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or(CompilerError::InvalidFieldReference)?
        .to_string();

    let values = items[1..].to_vec();
    let found = values.len();
    let expected: &'static str = if operator.is_unary() {
        "0"
    } else if operator.is_range() {
        "2"
    } else {
        "1"
    };
    let arity_ok = match expected {
        "0" => found == 0,
        "2" => found == 2,
        _ => found == 1,
    };
    if !arity_ok {
        return Err(CompilerError::WrongOperandCount {
            operator: token,
            expected,
            found,
        });
    }

    Ok(Condition { field, operator, values })
}
