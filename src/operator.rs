//! The internal operator set and JSON-Logic token canonicalization.
//!
//! JSON Logic uses surface tokens like `"=="`, `"!in"`, or the bare operator
//! name; the rest of the compiler only ever sees the canonical [`Operator`]
//! so every other component gets exhaustive matching instead of string
//! comparisons.

use crate::error::CompilerError;

/// Canonical comparison, set, array, string, null, JSON, and logical
/// operators recognized by the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    // Comparison
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,

    // Set / range
    In,
    NotIn,
    Between,
    NotBetween,

    // Array-column
    Contains,
    ContainedBy,
    Overlaps,
    AnyOf,
    NotAnyOf,
    AnyIlike,
    NotAnyIlike,

    // String
    Like,
    Ilike,
    StartsWith,
    EndsWith,
    Regex,

    // Null
    IsNull,
    IsNotNull,

    // JSONB
    JsonContains,
    JsonHasKey,
    JsonHasAnyKeys,

    // Logical (rule-tree connectives, not condition operators)
    And,
    Or,
    Not,
}

impl Operator {
    /// Canonicalize a JSON-Logic surface token to an internal operator.
    ///
    /// `"contains"` is intentionally ambiguous at this layer: it maps to
    /// [`Operator::Contains`], whose SQL meaning (array/jsonb containment vs.
    /// string substring) is resolved later by the dialect once the field's
    /// declared type is known (spec §4.1, §4.8).
    pub fn canonicalize(token: &str) -> Result<Self, CompilerError> {
        use Operator::*;
        Ok(match token {
            "==" | "===" | "eq" => Eq,
            "!=" | "!==" | "ne" => Ne,
            ">" | "gt" => Gt,
            ">=" | "gte" => Gte,
            "<" | "lt" => Lt,
            "<=" | "lte" => Lte,

            "in" => In,
            "!in" | "not_in" => NotIn,
            "between" => Between,
            "not_between" => NotBetween,

            "contains" => Contains,
            "contained_by" => ContainedBy,
            "overlaps" => Overlaps,
            "any_of" => AnyOf,
            "not_any_of" => NotAnyOf,
            "any_ilike" => AnyIlike,
            "not_any_ilike" => NotAnyIlike,

            "like" => Like,
            "ilike" => Ilike,
            "starts_with" => StartsWith,
            "ends_with" => EndsWith,
            "regex" => Regex,

            "is_null" => IsNull,
            "is_not_null" => IsNotNull,

            "json_contains" => JsonContains,
            "json_has_key" => JsonHasKey,
            "json_has_any_keys" => JsonHasAnyKeys,

            "and" => And,
            "or" => Or,
            "!" | "not" => Not,

            other => return Err(CompilerError::UnknownOperator(other.to_string())),
        })
    }

    /// Surface token this operator is rendered as in error messages.
    pub fn token(&self) -> &'static str {
        use Operator::*;
        match self {
            Eq => "eq",
            Ne => "ne",
            Gt => "gt",
            Gte => "gte",
            Lt => "lt",
            Lte => "lte",
            In => "in",
            NotIn => "not_in",
            Between => "between",
            NotBetween => "not_between",
            Contains => "contains",
            ContainedBy => "contained_by",
            Overlaps => "overlaps",
            AnyOf => "any_of",
            NotAnyOf => "not_any_of",
            AnyIlike => "any_ilike",
            NotAnyIlike => "not_any_ilike",
            Like => "like",
            Ilike => "ilike",
            StartsWith => "starts_with",
            EndsWith => "ends_with",
            Regex => "regex",
            IsNull => "is_null",
            IsNotNull => "is_not_null",
            JsonContains => "json_contains",
            JsonHasKey => "json_has_key",
            JsonHasAnyKeys => "json_has_any_keys",
            And => "and",
            Or => "or",
            Not => "not",
        }
    }

    /// `UNARY = {is_null, is_not_null}` — these never validate a value.
    pub fn is_unary(&self) -> bool {
        matches!(self, Operator::IsNull | Operator::IsNotNull)
    }

    /// `RANGE = {between, not_between}` — always consume exactly two values.
    pub fn is_range(&self) -> bool {
        matches!(self, Operator::Between | Operator::NotBetween)
    }

    /// Operators whose single operand is a homogeneous sequence of values,
    /// validated element-wise (spec invariant 3).
    ///
    /// `any_of`/`not_any_of`/`any_ilike`/`not_any_ilike` take a scalar
    /// operand compared against the column's elements, not a list, so they
    /// are excluded here even though they are array-column operators.
    pub fn is_set_valued(&self) -> bool {
        matches!(
            self,
            Operator::In | Operator::NotIn | Operator::Overlaps | Operator::ContainedBy
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, Operator::And | Operator::Or | Operator::Not)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalizes_comparison_aliases() {
        assert_eq!(Operator::canonicalize("==").unwrap(), Operator::Eq);
        assert_eq!(Operator::canonicalize("===").unwrap(), Operator::Eq);
        assert_eq!(Operator::canonicalize("!=").unwrap(), Operator::Ne);
        assert_eq!(Operator::canonicalize("!==").unwrap(), Operator::Ne);
        assert_eq!(Operator::canonicalize(">=").unwrap(), Operator::Gte);
    }

    #[test]
    fn canonicalizes_logical_aliases() {
        assert_eq!(Operator::canonicalize("!").unwrap(), Operator::Not);
        assert_eq!(Operator::canonicalize("not").unwrap(), Operator::Not);
    }

    #[test]
    fn rejects_unknown_token() {
        let err = Operator::canonicalize("xor").unwrap_err();
        assert_eq!(err, CompilerError::UnknownOperator("xor".into()));
    }

    #[test]
    fn classifies_unary_and_range() {
        assert!(Operator::IsNull.is_unary());
        assert!(!Operator::Eq.is_unary());
        assert!(Operator::Between.is_range());
        assert!(!Operator::In.is_range());
    }
}
