//! The in-memory document model produced by decoding and consumed by the
//! wire writer.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::constants::ElementType;

/// A single decoded wire value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum BsonValue {
    Double(f64),
    Str(String),
    Document(Document),
    Array(Vec<BsonValue>),
    Binary(Vec<u8>),
    Boolean(bool),
    /// Millisecond-precision UTC instant.
    DateTime(DateTime<Utc>),
    #[default]
    Null,
    Int32(i32),
    Int64(i64),
}

impl BsonValue {
    /// The tag this value is written with.
    pub fn element_type(&self) -> ElementType {
        match self {
            Self::Double(_) => ElementType::Double,
            Self::Str(_) => ElementType::String,
            Self::Document(_) => ElementType::Document,
            Self::Array(_) => ElementType::Array,
            Self::Binary(_) => ElementType::Binary,
            Self::Boolean(_) => ElementType::Boolean,
            Self::DateTime(_) => ElementType::DateTime,
            Self::Null => ElementType::Null,
            Self::Int32(_) => ElementType::Int32,
            Self::Int64(_) => ElementType::Int64,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.element_type().name()
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Int32(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer payload widened to 64 bits, for either integer tag.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int32(v) => Some(i64::from(*v)),
            Self::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Self::Document(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[BsonValue]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }
}

impl From<f64> for BsonValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<i32> for BsonValue {
    fn from(v: i32) -> Self {
        Self::Int32(v)
    }
}

impl From<i64> for BsonValue {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<bool> for BsonValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<&str> for BsonValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl From<String> for BsonValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<DateTime<Utc>> for BsonValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::DateTime(v)
    }
}

impl From<Document> for BsonValue {
    fn from(v: Document) -> Self {
        Self::Document(v)
    }
}

impl From<Vec<BsonValue>> for BsonValue {
    fn from(v: Vec<BsonValue>) -> Self {
        Self::Array(v)
    }
}

/// An insertion-ordered mapping from element name to value.
///
/// Inserting an existing key replaces the value in place; the key keeps its
/// original position.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    entries: IndexMap<String, BsonValue>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity),
        }
    }

    /// Inserts an entry, returning the value it replaced.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<BsonValue>,
    ) -> Option<BsonValue> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&BsonValue> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut BsonValue> {
        self.entries.get_mut(key)
    }

    /// Removes an entry, preserving the order of the others.
    pub fn remove(&mut self, key: &str) -> Option<BsonValue> {
        self.entries.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &BsonValue> {
        self.entries.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BsonValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, BsonValue)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, BsonValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Document {
    type Item = (String, BsonValue);
    type IntoIter = indexmap::map::IntoIter<String, BsonValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
