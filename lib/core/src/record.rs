use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;
use crate::{Error, Result};

/// Field holding a record's identifier
pub const ID_FIELD: &str = "id";

/// Field holding a record's product kind label
pub const KIND_FIELD: &str = "type";

/// Record identifier - stores use either string or integer ids
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Integer(i64),
    String(String),
}

impl RecordId {
    /// Read an identifier out of a JSON value, if it has a usable shape
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(RecordId::String(s.clone())),
            Value::Number(n) => n.as_i64().map(RecordId::Integer),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            RecordId::Integer(i) => Value::from(*i),
            RecordId::String(s) => Value::String(s.clone()),
        }
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordId::String(s) => write!(f, "{}", s),
            RecordId::Integer(i) => write!(f, "{}", i),
        }
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        RecordId::String(s)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId::String(s.to_string())
    }
}

impl From<i64> for RecordId {
    fn from(i: i64) -> Self {
        RecordId::Integer(i)
    }
}

impl From<Uuid> for RecordId {
    fn from(u: Uuid) -> Self {
        RecordId::String(u.to_string())
    }
}

/// An opaque review record: field key to JSON value.
///
/// Nothing is imposed on the shape beyond string keys. Auxiliary namespaces
/// (`extraData`, `categoryRatings`, ...) are ordinary nested fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self { fields: Map::new() }
    }

    /// Wrap a JSON value; anything but an object is rejected
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(Error::InvalidRecord(format!(
                "expected an object, got {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn id(&self) -> Option<RecordId> {
        self.fields.get(ID_FIELD).and_then(RecordId::from_value)
    }

    /// Assign a fresh v4 UUID when the record has no usable id
    pub fn ensure_id(&mut self) -> RecordId {
        if let Some(id) = self.id() {
            return id;
        }
        let id = RecordId::from(Uuid::new_v4());
        self.fields.insert(ID_FIELD.to_string(), id.to_value());
        id
    }

    /// Raw product kind label (`type` field)
    pub fn kind(&self) -> Option<&str> {
        self.get_str(KIND_FIELD)
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    #[inline]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    #[inline]
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    #[inline]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    #[inline]
    pub fn fields_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.fields
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_shapes() {
        let r = Record::from_value(json!({"id": 42})).unwrap();
        assert_eq!(r.id(), Some(RecordId::Integer(42)));

        let r = Record::from_value(json!({"id": "abc"})).unwrap();
        assert_eq!(r.id(), Some(RecordId::String("abc".into())));

        let r = Record::from_value(json!({"id": ""})).unwrap();
        assert_eq!(r.id(), None);
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(matches!(
            Record::from_value(json!([1, 2])),
            Err(Error::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_ensure_id_keeps_existing() {
        let mut r = Record::new().with_field("id", json!(7));
        assert_eq!(r.ensure_id(), RecordId::Integer(7));

        let mut fresh = Record::new();
        let id = fresh.ensure_id();
        assert_eq!(fresh.id(), Some(id));
    }
}
