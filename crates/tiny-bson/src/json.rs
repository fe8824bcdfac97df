//! JSON views of the document model.
//!
//! - binary → standard base64 string
//! - datetime → RFC 3339 string with millisecond precision, `Z` suffix
//! - non-finite doubles → `null`
//!
//! The conversion back has no type information beyond JSON's own, so
//! integers become int32 when they fit, int64 when they fit, double otherwise.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::SecondsFormat;
use serde_json::{Map, Number, Value};

use crate::value::{BsonValue, Document};

impl BsonValue {
    pub fn to_json(&self) -> Value {
        match self {
            Self::Double(v) => Number::from_f64(*v).map_or(Value::Null, Value::Number),
            Self::Str(s) => Value::String(s.clone()),
            Self::Document(document) => document.to_json(),
            Self::Array(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Binary(bytes) => Value::String(STANDARD.encode(bytes)),
            Self::Boolean(b) => Value::Bool(*b),
            Self::DateTime(dt) => Value::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Self::Null => Value::Null,
            Self::Int32(v) => Value::from(*v),
            Self::Int64(v) => Value::from(*v),
        }
    }

    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Boolean(*b),
            Value::Number(n) => match n.as_i64() {
                Some(v) => i32::try_from(v).map_or(Self::Int64(v), Self::Int32),
                None => Self::Double(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Self::Str(s.clone()),
            Value::Array(items) => Self::Array(items.iter().map(Self::from_json).collect()),
            Value::Object(map) => Self::Document(
                map.iter()
                    .map(|(key, value)| (key.clone(), Self::from_json(value)))
                    .collect(),
            ),
        }
    }
}

impl Document {
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .iter()
            .map(|(key, value)| (key.to_owned(), value.to_json()))
            .collect();
        Value::Object(map)
    }
}
