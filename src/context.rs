//! The per-compile mutable context (spec §3 "Compilation context").
//!
//! Created at the start of [`crate::compiler::compile`] and discarded on
//! return. Never thread-local or global: it is threaded through the walk by
//! mutable reference, and the active `field_type` is restored via a
//! stack-scoped guard so an early `?` return can't leave it stale.

use serde_json::Value;

use crate::schema::FieldType;

/// An insertion-ordered `p{i} -> value` map (spec §6 "params"). A plain
/// `Vec` already preserves insertion order and the keys are a deterministic
/// `p{i}` sequence, so no external ordered-map dependency is needed.
#[derive(Debug, Clone, Default)]
pub struct ParamMap {
    entries: Vec<(String, Value)>,
}

impl ParamMap {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Values in index order — `paramsArray[i-1] == params["p" + i]`
    /// (spec invariant 1).
    pub fn as_array(&self) -> Vec<Value> {
        self.entries.iter().map(|(_, v)| v.clone()).collect()
    }

    /// Render as a `serde_json` object, e.g. for API responses.
    pub fn as_object(&self) -> serde_json::Map<String, Value> {
        self.entries.iter().cloned().collect()
    }
}

/// A freshly registered parameter: its stable stored key (`p{i}`) and
/// numeric index (used to derive the dialect-specific placeholder token).
#[derive(Debug, Clone)]
pub struct RegisteredParam {
    pub key: String,
    pub index: usize,
}

/// Mutable state threaded through one `compile()` call.
pub struct CompileContext {
    pub depth: usize,
    pub condition_count: usize,
    next_parameter_index: usize,
    params: ParamMap,
    /// The field type currently in scope for a dialect emitter call, used
    /// for array/jsonb dispatch decisions. Save/restore via
    /// [`CompileContext::with_field_type`].
    pub field_type: Option<FieldType>,
    pub max_depth: usize,
    pub max_conditions: usize,
}

impl CompileContext {
    pub fn new(max_depth: usize, max_conditions: usize) -> Self {
        CompileContext {
            depth: 0,
            condition_count: 0,
            next_parameter_index: 1,
            params: ParamMap::default(),
            field_type: None,
            max_depth,
            max_conditions,
        }
    }

    /// Register a new parameter and return its stored key + index (spec
    /// §4.5). Indices are strictly monotonic and never reused.
    pub fn register_param(&mut self, value: Value) -> RegisteredParam {
        let index = self.next_parameter_index;
        self.next_parameter_index += 1;
        let key = format!("p{index}");
        self.params.entries.push((key.clone(), value));
        RegisteredParam { key, index }
    }

    pub fn next_index(&self) -> usize {
        self.next_parameter_index
    }

    pub fn params(&self) -> &ParamMap {
        &self.params
    }

    pub fn into_params(self) -> ParamMap {
        self.params
    }

    /// Run `f` with `field_type` active, restoring the previous value
    /// afterward even if `f` returns early via `?` (spec §9 "scoped guards").
    pub fn with_field_type<T>(
        &mut self,
        field_type: FieldType,
        f: impl FnOnce(&mut Self) -> T,
    ) -> T {
        let previous = self.field_type.replace(field_type);
        let result = f(self);
        self.field_type = previous;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_are_monotonic_and_ordered() {
        let mut ctx = CompileContext::new(5, 100);
        let k1 = ctx.register_param(Value::from(1));
        let k2 = ctx.register_param(Value::from("x"));
        assert_eq!(k1.key, "p1");
        assert_eq!(k2.key, "p2");
        assert_eq!(ctx.params().as_array(), vec![Value::from(1), Value::from("x")]);
    }

    #[test]
    fn field_type_guard_restores_on_exit() {
        let mut ctx = CompileContext::new(5, 100);
        ctx.field_type = Some(FieldType::String);
        ctx.with_field_type(FieldType::Integer, |inner| {
            assert_eq!(inner.field_type, Some(FieldType::Integer));
        });
        assert_eq!(ctx.field_type, Some(FieldType::String));
    }
}
