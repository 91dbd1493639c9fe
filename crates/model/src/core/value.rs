use crate::core::data_type::FieldType;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt, hash::Hash};
use uuid::Uuid;

/// A lazily-resolved handle to a persisted entity, identified by its
/// entity name and identifier value. Never carries the entity's state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub entity: String,
    pub id: Box<Value>,
}

impl EntityRef {
    pub fn new(entity: impl Into<String>, id: Value) -> Self {
        Self {
            entity: entity.into(),
            id: Box::new(id),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Json(serde_json::Value),
    Uuid(Uuid),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    Reference(EntityRef),
    List(Vec<Value>),
    Null,
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        use Value::*;
        std::mem::discriminant(self).hash(state);
        match self {
            Int(v) => v.hash(state),
            Float(v) => {
                // Hash the bits of the float to handle NaN and -0.0 correctly
                let bits = v.to_bits();
                bits.hash(state);
            }
            String(v) => v.hash(state),
            Boolean(v) => v.hash(state),
            Json(v) => {
                let json_str = serde_json::to_string(v).unwrap_or_default();
                json_str.hash(state);
            }
            Uuid(v) => v.hash(state),
            Date(v) => v.hash(state),
            Timestamp(v) => v.hash(state),
            Reference(v) => v.hash(state),
            List(v) => v.hash(state),
            Null => {}
        }
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Emptiness as the editor's required-field check sees it: null, a
    /// zero-length string or an empty list.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            Value::List(items) => items.is_empty(),
            _ => false,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Float(v) => Some(*v as i64),
            Value::String(v) => v.trim().parse::<i64>().ok(),
            Value::Boolean(v) => Some(i64::from(*v)),
            Value::Json(v) => v.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::String(v) => v.trim().parse::<f64>().ok(),
            Value::Boolean(v) => Some(if *v { 1.0 } else { 0.0 }),
            Value::Json(v) => v.as_f64(),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<String> {
        match self {
            Value::Int(v) => Some(v.to_string()),
            Value::Float(v) => Some(v.to_string()),
            Value::String(v) => Some(v.clone()),
            Value::Boolean(v) => Some(v.to_string()),
            Value::Json(v) => v.as_str().map(|s| s.to_string()),
            Value::Uuid(v) => Some(v.to_string()),
            Value::Date(v) => Some(v.to_string()),
            Value::Timestamp(v) => Some(v.to_rfc3339()),
            Value::Reference(r) => r.id.as_string(),
            Value::List(_) => None,
            Value::Null => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Int(v) => Some(*v != 0),
            Value::Float(v) => Some(*v != 0.0),
            Value::String(v) => match v.trim().to_lowercase().as_str() {
                "true" | "1" => Some(true),
                "false" | "0" | "" => Some(false),
                _ => None,
            },
            Value::Boolean(v) => Some(*v),
            Value::Json(v) => v.as_bool(),
            _ => None,
        }
    }

    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        use Value::*;
        match (self, other) {
            (Int(a), Int(b)) => Some(a.cmp(b)),
            (Float(a), Float(b)) => a.partial_cmp(b),
            (Int(a), Float(b)) => (*a as f64).partial_cmp(b),
            (Float(a), Int(b)) => a.partial_cmp(&(*b as f64)),
            (String(a), String(b)) => Some(a.cmp(b)),
            (Boolean(a), Boolean(b)) => Some(a.cmp(b)),
            (Uuid(a), Uuid(b)) => Some(a.cmp(b)),
            (Date(a), Date(b)) => Some(a.cmp(b)),
            (Timestamp(a), Timestamp(b)) => Some(a.cmp(b)),
            (Null, Null) => Some(Ordering::Equal),
            _ => None,
        }
    }

    pub fn equal(&self, other: &Value) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }

    pub fn field_type(&self) -> Option<FieldType> {
        match self {
            Value::Int(_) => Some(FieldType::BigInt),
            Value::Float(_) => Some(FieldType::Float),
            Value::String(_) => Some(FieldType::String),
            Value::Boolean(_) => Some(FieldType::Boolean),
            Value::Json(_) => Some(FieldType::Json),
            Value::Uuid(_) => Some(FieldType::Uuid),
            Value::Date(_) => Some(FieldType::Date),
            Value::Timestamp(_) => Some(FieldType::DateTime),
            Value::Reference(_) | Value::List(_) | Value::Null => None,
        }
    }

    /// Converts the value into its wire representation. References collapse
    /// to their identifier.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Int(v) => Json::from(*v),
            Value::Float(v) => serde_json::Number::from_f64(*v)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::String(v) => Json::String(v.clone()),
            Value::Boolean(v) => Json::Bool(*v),
            Value::Json(v) => v.clone(),
            Value::Uuid(v) => Json::String(v.to_string()),
            Value::Date(v) => Json::String(v.format("%Y-%m-%d").to_string()),
            Value::Timestamp(v) => Json::String(v.to_rfc3339()),
            Value::Reference(r) => r.id.to_json(),
            Value::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Null => Json::Null,
        }
    }

    /// Builds a value from submitted JSON. Numbers keep their integer-ness,
    /// objects stay opaque JSON.
    pub fn from_json(json: &serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Boolean(*b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
            },
            Json::String(s) => Value::String(s.clone()),
            Json::Array(items) => Value::List(items.iter().map(Value::from_json).collect()),
            Json::Object(_) => Value::Json(json.clone()),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldValue {
    pub name: String,
    pub value: Value,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "'{}'", v.replace('\'', "''")),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Json(v) => write!(f, "'{}'", v.to_string().replace('\'', "''")),
            Value::Uuid(v) => write!(f, "{v}"),
            Value::Date(v) => write!(f, "'{v}'"),
            Value::Timestamp(v) => write!(f, "'{v}'"),
            Value::Reference(r) => write!(f, "{}#{}", r.entity, r.id),
            Value::List(items) => {
                let parts = items.iter().map(|v| v.to_string()).collect::<Vec<_>>();
                write!(f, "[{}]", parts.join(", "))
            }
            Value::Null => write!(f, "NULL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_emptiness() {
        assert!(Value::Null.is_empty());
        assert!(Value::String(String::new()).is_empty());
        assert!(Value::List(vec![]).is_empty());
        assert!(!Value::Int(0).is_empty());
        assert!(!Value::String(" ".into()).is_empty());
    }

    #[test]
    fn test_json_conversion_keeps_integers() {
        let value = Value::from_json(&json!([1, 2.5, "x", null, true]));
        assert_eq!(
            value,
            Value::List(vec![
                Value::Int(1),
                Value::Float(2.5),
                Value::String("x".into()),
                Value::Null,
                Value::Boolean(true),
            ])
        );
        assert_eq!(value.to_json(), json!([1, 2.5, "x", null, true]));
    }

    #[test]
    fn test_reference_serializes_as_identifier() {
        let reference = Value::Reference(EntityRef::new("Author", Value::Int(7)));
        assert_eq!(reference.to_json(), json!(7));
        assert_eq!(reference.as_string(), Some("7".to_string()));
    }

    #[test]
    fn test_string_parsing_helpers() {
        assert_eq!(Value::from(" 42 ").as_i64(), Some(42));
        assert_eq!(Value::from("4x").as_i64(), None);
        assert_eq!(Value::from("TRUE").as_bool(), Some(true));
        assert!(Value::Int(3).equal(&Value::Float(3.0)));
    }
}
