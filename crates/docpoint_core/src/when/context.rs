//! Runtime context that when clauses are evaluated against.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Context keys and their current values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WhenContext {
    values: BTreeMap<String, Value>,
}

impl WhenContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a context from a JSON object; anything else yields `None`.
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self {
                values: map.into_iter().collect(),
            }),
            _ => None,
        }
    }

    /// Builder-style setter.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Missing, `null`, `false`, `0` and `""` are falsy; everything else is
    /// truthy.
    pub fn is_truthy(&self, key: &str) -> bool {
        match self.values.get(key) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(value)) => *value,
            Some(Value::Number(number)) => number.as_f64().is_some_and(|value| value != 0.0),
            Some(Value::String(value)) => !value.is_empty(),
            Some(Value::Array(_)) | Some(Value::Object(_)) => true,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::WhenContext;
    use serde_json::json;

    #[test]
    fn truthiness_follows_context_key_rules() {
        let context = WhenContext::new()
            .with("flag", true)
            .with("off", false)
            .with("zero", 0)
            .with("count", 2)
            .with("empty", "")
            .with("lang", "rust")
            .with("nothing", serde_json::Value::Null)
            .with("list", json!([]));

        assert!(context.is_truthy("flag"));
        assert!(!context.is_truthy("off"));
        assert!(!context.is_truthy("zero"));
        assert!(context.is_truthy("count"));
        assert!(!context.is_truthy("empty"));
        assert!(context.is_truthy("lang"));
        assert!(!context.is_truthy("nothing"));
        assert!(context.is_truthy("list"));
        assert!(!context.is_truthy("missing"));
    }

    #[test]
    fn from_json_accepts_objects_only() {
        let context = WhenContext::from_json(json!({"editorHasSelection": true}))
            .expect("object context");
        assert_eq!(context.len(), 1);
        assert!(WhenContext::from_json(json!([1, 2])).is_none());
    }
}
