//! Encode and decode error types.

use thiserror::Error;
use tiny_bson_buffers::BufferError;

use crate::diagnostics::Diagnostic;
use crate::value::BsonValue;

/// Error returned when a byte stream cannot be turned into a value.
///
/// The first group of variants are format violations and always abort the
/// whole decode. The second group are mapping failures; under the lenient
/// policy they are recovered per field and only reach the caller when the
/// top-level target itself cannot be produced.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecodeError {
    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEof { offset: usize },
    #[error("unknown element tag 0x{tag:02x} at offset {offset}")]
    UnknownTag { tag: u8, offset: usize },
    #[error("invalid length {length} at offset {offset}")]
    InvalidLength { length: i64, offset: usize },
    #[error("missing terminator at offset {offset}")]
    MissingTerminator { offset: usize },
    #[error("invalid UTF-8 at offset {offset}")]
    InvalidUtf8 { offset: usize },
    #[error("empty element name at offset {offset}")]
    EmptyName { offset: usize },
    #[error("invalid boolean byte 0x{byte:02x} at offset {offset}")]
    InvalidBoolean { byte: u8, offset: usize },
    #[error("datetime {millis}ms is out of range at offset {offset}")]
    DateOutOfRange { millis: i64, offset: usize },
    #[error("document nesting exceeds {0} levels")]
    DepthLimit(usize),

    #[error("expected {expected}, found {found}")]
    Mismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("null cannot be stored in {target}")]
    UnexpectedNull { target: &'static str },
    #[error("{value} is out of range for {target}")]
    OutOfRange { value: String, target: &'static str },
    /// A field failed under the strict policy.
    #[error("{path}: {source}")]
    Field {
        path: String,
        source: Box<DecodeError>,
    },
    /// A recoverable condition was escalated by the strict policy.
    #[error("rejected: {0}")]
    Rejected(Box<Diagnostic>),
    #[error("{0}")]
    Custom(String),
}

impl DecodeError {
    /// Mismatch between a target type and the raw wire value offered for it.
    pub fn mismatch(expected: &'static str, found: &BsonValue) -> Self {
        Self::Mismatch {
            expected,
            found: found.type_name(),
        }
    }

    pub fn out_of_range(value: impl ToString, target: &'static str) -> Self {
        Self::OutOfRange {
            value: value.to_string(),
            target,
        }
    }

    /// Whether the error is a wire-format violation rather than a mapping
    /// failure.
    pub fn is_format_violation(&self) -> bool {
        matches!(
            self,
            Self::UnexpectedEof { .. }
                | Self::UnknownTag { .. }
                | Self::InvalidLength { .. }
                | Self::MissingTerminator { .. }
                | Self::InvalidUtf8 { .. }
                | Self::EmptyName { .. }
                | Self::InvalidBoolean { .. }
                | Self::DateOutOfRange { .. }
                | Self::DepthLimit(_)
        )
    }
}

impl From<BufferError> for DecodeError {
    fn from(err: BufferError) -> Self {
        match err {
            BufferError::EndOfBuffer { offset, .. } => Self::UnexpectedEof { offset },
            BufferError::InvalidUtf8 { offset } => Self::InvalidUtf8 { offset },
            BufferError::Overflow => Self::Custom(err.to_string()),
        }
    }
}

/// Error returned when a host value cannot be written.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EncodeError {
    #[error("type `{type_name}` has no wire representation (at {path})")]
    Unsupported {
        type_name: &'static str,
        path: String,
    },
    #[error("{value} does not fit {target} (at {path})")]
    Overflow {
        value: String,
        target: &'static str,
        path: String,
    },
    #[error("value of type `{0}` does not encode to a document")]
    NotADocument(&'static str),
    #[error("invalid element name {0:?}")]
    InvalidName(String),
    #[error("string value contains an embedded NUL byte")]
    EmbeddedNul,
    #[error("document of {0} bytes exceeds the int32 length field")]
    TooLarge(usize),
    #[error("{0}")]
    Custom(String),
}

impl EncodeError {
    pub fn unsupported(type_name: &'static str) -> Self {
        Self::Unsupported {
            type_name,
            path: String::new(),
        }
    }

    pub fn overflow(value: impl ToString, target: &'static str) -> Self {
        Self::Overflow {
            value: value.to_string(),
            target,
            path: String::new(),
        }
    }

    /// Fills in the location for errors raised without one.
    pub(crate) fn at(mut self, location: impl ToString) -> Self {
        match &mut self {
            Self::Unsupported { path, .. } | Self::Overflow { path, .. } if path.is_empty() => {
                *path = location.to_string();
            }
            _ => {}
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tag_display_names_tag_and_offset() {
        let err = DecodeError::UnknownTag {
            tag: 0x14,
            offset: 4,
        };
        assert_eq!(err.to_string(), "unknown element tag 0x14 at offset 4");
        assert!(err.is_format_violation());
    }

    #[test]
    fn mismatch_uses_wire_type_name() {
        let err = DecodeError::mismatch("i32", &BsonValue::Str("x".into()));
        assert_eq!(err.to_string(), "expected i32, found string");
        assert!(!err.is_format_violation());
    }

    #[test]
    fn field_error_display_prefixes_path() {
        let err = DecodeError::Field {
            path: "address.zip".into(),
            source: Box::new(DecodeError::UnexpectedNull { target: "i32" }),
        };
        assert_eq!(err.to_string(), "address.zip: null cannot be stored in i32");
    }

    #[test]
    fn buffer_errors_map_to_format_violations() {
        let err: DecodeError = BufferError::EndOfBuffer {
            offset: 9,
            needed: 4,
        }
        .into();
        assert_eq!(err, DecodeError::UnexpectedEof { offset: 9 });
    }

    #[test]
    fn encode_error_at_only_fills_missing_path() {
        let err = EncodeError::unsupported("char").at("a.b");
        assert_eq!(
            err,
            EncodeError::Unsupported {
                type_name: "char",
                path: "a.b".into()
            }
        );
        let err = err.at("other");
        assert_eq!(err.to_string(), "type `char` has no wire representation (at a.b)");
    }

    #[test]
    fn errors_are_std_errors() {
        let err: Box<dyn std::error::Error> = Box::new(EncodeError::EmbeddedNul);
        assert_eq!(err.to_string(), "string value contains an embedded NUL byte");
    }
}
