//! In-memory parameter model shared by every device codec.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// A single parameter value.
///
/// Almost everything on a synthesizer is a bounded integer; patch and label
/// names are the exception and are kept as text until they hit the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Bounded integer parameter
    Int(i32),
    /// Fixed-width text parameter
    Text(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "{:?}", s),
        }
    }
}

/// Key/value parameter set for one patch.
///
/// Keys are fixed by the device schema when the model is built; the setters
/// refuse keys that were never defined, so a typo in a field table surfaces
/// as an error instead of a silently ignored parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterModel {
    values: BTreeMap<String, Value>,
}

impl ParameterModel {
    /// Create an empty model. Normally built through
    /// [`Schema::defaults`](crate::schema::Schema::defaults).
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `key` with an initial value, replacing any previous entry.
    pub fn define(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    /// Whether `key` is defined.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Raw value lookup.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Integer value of `key`.
    pub fn int(&self, key: &str) -> Result<i32, ModelError> {
        match self.values.get(key) {
            Some(Value::Int(v)) => Ok(*v),
            Some(Value::Text(_)) => Err(ModelError::WrongKind {
                key: key.to_string(),
                expected: "an integer",
            }),
            None => Err(ModelError::Undefined(key.to_string())),
        }
    }

    /// Text value of `key`.
    pub fn text(&self, key: &str) -> Result<&str, ModelError> {
        match self.values.get(key) {
            Some(Value::Text(s)) => Ok(s),
            Some(Value::Int(_)) => Err(ModelError::WrongKind {
                key: key.to_string(),
                expected: "text",
            }),
            None => Err(ModelError::Undefined(key.to_string())),
        }
    }

    /// Overwrite an integer parameter. The key must already be an integer.
    pub fn set_int(&mut self, key: &str, value: i32) -> Result<(), ModelError> {
        match self.values.get_mut(key) {
            Some(Value::Int(v)) => {
                *v = value;
                Ok(())
            }
            Some(Value::Text(_)) => Err(ModelError::WrongKind {
                key: key.to_string(),
                expected: "an integer",
            }),
            None => Err(ModelError::Undefined(key.to_string())),
        }
    }

    /// Overwrite a text parameter. The key must already be text.
    pub fn set_text(&mut self, key: &str, value: impl Into<String>) -> Result<(), ModelError> {
        match self.values.get_mut(key) {
            Some(Value::Text(s)) => {
                *s = value.into();
                Ok(())
            }
            Some(Value::Int(_)) => Err(ModelError::WrongKind {
                key: key.to_string(),
                expected: "text",
            }),
            None => Err(ModelError::Undefined(key.to_string())),
        }
    }

    /// Number of defined keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no keys are defined.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over all keys in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}
