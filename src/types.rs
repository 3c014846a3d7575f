//! Core data model: typed values, field types, and the fact authoring record.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// Represents a single field value inside a fact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// String value
    String(String),
    /// Integer value (i64)
    Integer(i64),
    /// Floating point value (f64)
    Float(f64),
    /// Boolean value
    Boolean(bool),
    /// Array of values (used by `In` constraint literals)
    Array(Vec<Value>),
    /// Null value (JSON interop only; schemas never admit it)
    Null,
}

impl Value {
    /// Field type this value inhabits, if any
    pub fn field_type(&self) -> Option<FieldType> {
        match self {
            Value::String(_) => Some(FieldType::String),
            Value::Integer(_) => Some(FieldType::Integer),
            Value::Float(_) => Some(FieldType::Float),
            Value::Boolean(_) => Some(FieldType::Boolean),
            Value::Array(_) => Some(FieldType::Array),
            Value::Null => None,
        }
    }

    /// Human-readable type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self.field_type() {
            Some(ty) => ty.name(),
            None => "null",
        }
    }

    /// Convert to number (f64) for ordered comparisons
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Ordered comparison between values of an ordered type.
    ///
    /// Numeric values cross-compare (`Integer` against `Float`); strings
    /// compare lexicographically. Anything else has no ordering.
    pub fn ordered_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            _ => {
                let (a, b) = (self.as_number()?, other.as_number()?);
                a.partial_cmp(&b)
            }
        }
    }

    /// Canonical rendering used as a hash-index key and for canonicalizing
    /// constraint sets. Distinct values render distinctly within one declared
    /// field type, which is all the join indexes require.
    pub fn index_key(&self) -> String {
        match self {
            Value::String(s) => format!("s:{}", s),
            Value::Integer(i) => format!("i:{}", i),
            Value::Float(f) => format!("f:{}", f.to_bits()),
            Value::Boolean(b) => format!("b:{}", b),
            Value::Array(items) => {
                let inner: Vec<String> = items.iter().map(Value::index_key).collect();
                format!("a:[{}]", inner.join(","))
            }
            Value::Null => "n".to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(n) => write!(f, "{}", n),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Array(_) => write!(f, "[Array]"),
            Value::Null => write!(f, "null"),
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(arr: Vec<Value>) -> Self {
        Value::Array(arr)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json_value: serde_json::Value) -> Self {
        match json_value {
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    Value::Float(f)
                } else {
                    Value::Null
                }
            }
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Array(arr) => {
                Value::Array(arr.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(_) => Value::Null,
            serde_json::Value::Null => Value::Null,
        }
    }
}

/// Declared type of a fact field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    /// UTF-8 string
    String,
    /// 64-bit signed integer
    Integer,
    /// 64-bit float
    Float,
    /// Boolean
    Boolean,
    /// Array of values
    Array,
}

impl FieldType {
    /// Type name for error messages
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Boolean => "boolean",
            FieldType::Array => "array",
        }
    }

    /// Whether ordering operators (`<`, `<=`, `>`, `>=`) apply
    pub fn is_ordered(&self) -> bool {
        matches!(self, FieldType::String | FieldType::Integer | FieldType::Float)
    }

    /// Whether a value is admissible for a field of this type.
    ///
    /// The single coercion anywhere in the engine: integer values are
    /// accepted for float fields.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (FieldType::Float, Value::Integer(_)) => true,
            _ => value.field_type() == Some(*self),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A fact as authored by the caller: a fact type name plus named field
/// values. Validated against the registered schema before it enters working
/// memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    /// Fact type name (e.g. "Patient", "Order")
    pub fact_type: String,
    /// Field values by name
    pub fields: HashMap<String, Value>,
}

impl Fact {
    /// Create an empty fact of the given type
    pub fn new(fact_type: impl Into<String>) -> Self {
        Self {
            fact_type: fact_type.into(),
            fields: HashMap::new(),
        }
    }

    /// Builder: set a field value
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Set a field value
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Get a field value
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Build a fact from a JSON object; non-object input yields an empty
    /// field set
    pub fn from_json(fact_type: impl Into<String>, json: serde_json::Value) -> Self {
        let mut fact = Fact::new(fact_type);
        if let serde_json::Value::Object(map) = json {
            for (key, value) in map {
                fact.fields.insert(key, Value::from(value));
            }
        }
        fact
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.fact_type)?;
        let mut names: Vec<&String> = self.fields.keys().collect();
        names.sort();
        for (i, name) in names.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", name, self.fields[*name])?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_types() {
        assert_eq!(Value::from("hello").field_type(), Some(FieldType::String));
        assert_eq!(Value::from(42i64).field_type(), Some(FieldType::Integer));
        assert_eq!(Value::from(1.5).field_type(), Some(FieldType::Float));
        assert_eq!(Value::from(true).field_type(), Some(FieldType::Boolean));
        assert_eq!(Value::Null.field_type(), None);
    }

    #[test]
    fn test_ordered_cmp() {
        let a = Value::Integer(10);
        let b = Value::Float(10.5);
        assert_eq!(a.ordered_cmp(&b), Some(Ordering::Less));
        assert_eq!(b.ordered_cmp(&a), Some(Ordering::Greater));
        assert_eq!(
            Value::from("abc").ordered_cmp(&Value::from("abd")),
            Some(Ordering::Less)
        );
        assert_eq!(Value::Boolean(true).ordered_cmp(&Value::Boolean(false)), None);
    }

    #[test]
    fn test_index_key_distinguishes_types() {
        assert_ne!(Value::from("1").index_key(), Value::from(1i64).index_key());
        assert_eq!(Value::from(7i64).index_key(), Value::Integer(7).index_key());
    }

    #[test]
    fn test_field_type_accepts() {
        assert!(FieldType::Float.accepts(&Value::Integer(3)));
        assert!(!FieldType::Integer.accepts(&Value::Float(3.0)));
        assert!(!FieldType::String.accepts(&Value::Null));
    }

    #[test]
    fn test_fact_builder() {
        let fact = Fact::new("Patient").with("name", "A").with("heartbeat", 145i64);
        assert_eq!(fact.get("name"), Some(&Value::String("A".to_string())));
        assert_eq!(fact.get("heartbeat"), Some(&Value::Integer(145)));
        assert_eq!(fact.get("missing"), None);
    }

    #[test]
    fn test_fact_from_json() {
        let json = serde_json::json!({"id": 1, "status": "VIP"});
        let fact = Fact::from_json("Client", json);
        assert_eq!(fact.get("id"), Some(&Value::Integer(1)));
        assert_eq!(fact.get("status"), Some(&Value::String("VIP".to_string())));
    }
}
