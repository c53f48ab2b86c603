//! Input sanitization (spec §4.2, Component A): the first thing that
//! happens to a rule tree, before it is parsed into [`crate::rule::Rule`].
//!
//! Three independent defenses, all cheap compared to the validation and
//! compilation passes that follow:
//! - strip prototype-pollution key names out of every JSON object
//! - reject a tree that revisits the same node on one DFS path
//! - reject identifiers and parameter values carrying an embedded NUL byte

use std::collections::HashSet;

use serde_json::Value;

use crate::error::{InputIntegrityError, InvalidIdentifier, InvalidParameter};

/// Keys that would corrupt a JS-side `Object.prototype` if this tree were
/// ever round-tripped through a JS consumer; stripped defensively even
/// though `serde_json::Value` itself has no prototype to pollute.
const DISALLOWED_KEYS: [&str; 3] = ["__proto__", "constructor", "prototype"];

/// Validate a dot-separated identifier (`column`, `schema.table.column`):
/// 1-3 segments, each matching `[A-Za-z_][A-Za-z0-9_]*` (spec §4.2).
pub fn check_identifier(ident: &str) -> Result<(), InvalidIdentifier> {
    let parts: Vec<&str> = ident.split('.').collect();
    if parts.is_empty() || parts.len() > 3 {
        return Err(InvalidIdentifier(ident.to_string()));
    }
    for part in &parts {
        if !is_valid_identifier_segment(part) {
            return Err(InvalidIdentifier(ident.to_string()));
        }
    }
    Ok(())
}

fn is_valid_identifier_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Strip disallowed keys from every object in the tree and return the
/// cleaned copy. Rejects the tree outright if it revisits an object or
/// array by pointer identity on the same DFS path — only possible for a
/// tree assembled programmatically with shared `Rc`/`Arc` subtrees, since a
/// tree freshly produced by `serde_json::from_str` is a strict DAG with no
/// shared nodes, but the check costs nothing to keep.
pub fn sanitize_rule(value: &Value) -> Result<Value, InputIntegrityError> {
    let mut seen = HashSet::new();
    let cleaned = walk(value, &mut seen)?;
    if matches!(&cleaned, Value::Object(m) if m.is_empty())
        || matches!(&cleaned, Value::Null)
    {
        return Err(InputIntegrityError::InvalidInput);
    }
    Ok(cleaned)
}

fn walk(value: &Value, seen: &mut HashSet<usize>) -> Result<Value, InputIntegrityError> {
    match value {
        Value::Object(map) => {
            let addr = value as *const Value as usize;
            if !seen.insert(addr) {
                return Err(InputIntegrityError::CircularReference);
            }
            let mut cleaned = serde_json::Map::with_capacity(map.len());
            for (key, v) in map {
                if DISALLOWED_KEYS.contains(&key.as_str()) {
                    continue;
                }
                cleaned.insert(key.clone(), walk(v, seen)?);
            }
            seen.remove(&addr);
            Ok(Value::Object(cleaned))
        }
        Value::Array(items) => {
            let addr = value as *const Value as usize;
            if !seen.insert(addr) {
                return Err(InputIntegrityError::CircularReference);
            }
            let cleaned: Result<Vec<Value>, InputIntegrityError> =
                items.iter().map(|v| walk(v, seen)).collect();
            seen.remove(&addr);
            Ok(Value::Array(cleaned?))
        }
        other => Ok(other.clone()),
    }
}

/// Reject a value carrying an embedded NUL byte, which several drivers
/// silently truncate at bind time (spec invariant 8).
pub fn check_no_embedded_nul(value: &Value) -> Result<(), InvalidParameter> {
    match value {
        Value::String(s) if s.contains('\0') => Err(InvalidParameter::EmbeddedNul),
        Value::Array(items) => {
            for item in items {
                check_no_embedded_nul(item)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_plain_and_qualified_identifiers() {
        assert!(check_identifier("status").is_ok());
        assert!(check_identifier("public.orders.status").is_ok());
    }

    #[test]
    fn rejects_leading_digit_and_too_many_segments() {
        assert!(check_identifier("1status").is_err());
        assert!(check_identifier("a.b.c.d").is_err());
        assert!(check_identifier("status;drop table x").is_err());
    }

    #[test]
    fn strips_proto_pollution_keys() {
        let input = json!({"__proto__": {"polluted": true}, "==": [{"var": "x"}, 1]});
        let cleaned = sanitize_rule(&input).unwrap();
        assert_eq!(cleaned, json!({"==": [{"var": "x"}, 1]}));
    }

    #[test]
    fn rejects_input_that_is_empty_after_stripping() {
        let input = json!({"__proto__": {"x": 1}});
        assert_eq!(sanitize_rule(&input), Err(InputIntegrityError::InvalidInput));
    }

    #[test]
    fn detects_embedded_nul_in_scalar_and_array() {
        assert_eq!(
            check_no_embedded_nul(&json!("abc\0def")),
            Err(InvalidParameter::EmbeddedNul)
        );
        assert_eq!(
            check_no_embedded_nul(&json!(["ok", "bad\0"])),
            Err(InvalidParameter::EmbeddedNul)
        );
        assert!(check_no_embedded_nul(&json!(["ok", 42, true])).is_ok());
    }
}
