//! Wire-level constants.

/// Element tag byte.
///
/// Only these tags are understood; any other byte in tag position is a
/// format violation for the enclosing document.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Double = 0x01,
    String = 0x02,
    Document = 0x03,
    Array = 0x04,
    Binary = 0x05,
    Boolean = 0x08,
    DateTime = 0x09,
    Null = 0x0a,
    Int32 = 0x10,
    Int64 = 0x12,
}

impl ElementType {
    pub fn from_u8(tag: u8) -> Option<Self> {
        Some(match tag {
            0x01 => Self::Double,
            0x02 => Self::String,
            0x03 => Self::Document,
            0x04 => Self::Array,
            0x05 => Self::Binary,
            0x08 => Self::Boolean,
            0x09 => Self::DateTime,
            0x0a => Self::Null,
            0x10 => Self::Int32,
            0x12 => Self::Int64,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Double => "double",
            Self::String => "string",
            Self::Document => "document",
            Self::Array => "array",
            Self::Binary => "binary",
            Self::Boolean => "boolean",
            Self::DateTime => "datetime",
            Self::Null => "null",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
        }
    }
}

/// Terminator byte for documents and cstrings.
pub const TERMINATOR: u8 = 0x00;

/// Binary subtype written for every byte payload. Readers ignore it.
pub const BINARY_SUBTYPE_GENERIC: u8 = 0x00;

/// Default bound on document nesting during decode.
pub const DEFAULT_MAX_DEPTH: usize = 128;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_u8_accepts_every_known_tag() {
        for tag in [0x01, 0x02, 0x03, 0x04, 0x05, 0x08, 0x09, 0x0a, 0x10, 0x12] {
            let ty = ElementType::from_u8(tag).unwrap();
            assert_eq!(ty as u8, tag);
        }
    }

    #[test]
    fn from_u8_rejects_unknown_tags() {
        for tag in [0x00, 0x06, 0x07, 0x0b, 0x11, 0x13, 0x7f, 0xff] {
            assert_eq!(ElementType::from_u8(tag), None);
        }
    }

    #[test]
    fn names() {
        assert_eq!(ElementType::Int32.name(), "int32");
        assert_eq!(ElementType::Null.name(), "null");
    }
}
