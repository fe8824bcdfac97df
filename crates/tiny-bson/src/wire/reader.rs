//! Bytes → Document.

use chrono::DateTime;
use tiny_bson_buffers::Reader;

use crate::constants::{ElementType, DEFAULT_MAX_DEPTH, TERMINATOR};
use crate::diagnostics::{DiagnosticKind, Diagnostics, Path};
use crate::error::DecodeError;
use crate::value::{BsonValue, Document};

/// Parses the tagged wire format into [`Document`]s.
///
/// Format violations (unknown tags, bad framing, truncated payloads) abort the
/// whole parse. Duplicate keys, non-dense array keys and trailing bytes are
/// handed to [`Diagnostics`], which records or rejects them per policy.
pub struct WireReader<'a, 'd> {
    reader: Reader<'a>,
    diagnostics: &'d mut Diagnostics,
    path: Path,
    depth: usize,
    max_depth: usize,
}

impl<'a, 'd> WireReader<'a, 'd> {
    pub fn new(data: &'a [u8], diagnostics: &'d mut Diagnostics) -> Self {
        Self {
            reader: Reader::new(data),
            diagnostics,
            path: Path::new(),
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Reads the buffer as exactly one top-level document.
    pub fn read_top_level(&mut self) -> Result<Document, DecodeError> {
        let document = self.read_document(false)?;
        let rest = self.reader.size();
        if rest > 0 {
            self.diagnostics
                .report(&self.path, DiagnosticKind::TrailingBytes { count: rest })?;
        }
        Ok(document)
    }

    /// Reads one length-framed document at the cursor.
    ///
    /// With `array` set, numeric keys are tracked as positions so nested
    /// diagnostics render as `tags[1]`.
    pub fn read_document(&mut self, array: bool) -> Result<Document, DecodeError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(DecodeError::DepthLimit(self.max_depth));
        }
        let start = self.reader.position();
        let length = self.reader.i32_le()?;
        let invalid = DecodeError::InvalidLength {
            length: i64::from(length),
            offset: start,
        };
        if length < 1 {
            return Err(invalid);
        }
        let end = start + 4 + length as usize;
        if end > self.reader.end {
            return Err(invalid);
        }
        let body_end = end - 1;

        let mut document = Document::new();
        while self.reader.position() < body_end {
            let (name, value) = self.read_element(array)?;
            if self.reader.position() > body_end {
                return Err(invalid);
            }
            if document.insert(name.clone(), value).is_some() {
                self.push_name(&name, array);
                let reported = self
                    .diagnostics
                    .report(&self.path, DiagnosticKind::DuplicateKey { key: name });
                self.path.pop();
                reported?;
            }
        }

        let offset = self.reader.position();
        if self.reader.u8()? != TERMINATOR {
            return Err(DecodeError::MissingTerminator { offset });
        }
        self.depth -= 1;
        Ok(document)
    }

    /// Reads one element: tag byte, name, payload.
    pub fn read_element(&mut self, array: bool) -> Result<(String, BsonValue), DecodeError> {
        let offset = self.reader.position();
        let tag = self.reader.u8()?;
        let element_type =
            ElementType::from_u8(tag).ok_or(DecodeError::UnknownTag { tag, offset })?;

        let name_offset = self.reader.position();
        let name = self.reader.cstring()?;
        if name.is_empty() {
            return Err(DecodeError::EmptyName {
                offset: name_offset,
            });
        }

        self.push_name(name, array);
        let value = self.read_value(element_type);
        self.path.pop();
        Ok((name.to_owned(), value?))
    }

    fn push_name(&mut self, name: &str, array: bool) {
        match name.parse::<usize>() {
            Ok(index) if array => self.path.push_index(index),
            _ => self.path.push_key(name),
        }
    }

    fn read_value(&mut self, element_type: ElementType) -> Result<BsonValue, DecodeError> {
        Ok(match element_type {
            ElementType::Double => BsonValue::Double(self.reader.f64_le()?),
            ElementType::String => BsonValue::Str(self.read_string()?),
            ElementType::Document => BsonValue::Document(self.read_document(false)?),
            ElementType::Array => {
                let document = self.read_document(true)?;
                BsonValue::Array(array_from_document(document, &self.path, self.diagnostics)?)
            }
            ElementType::Binary => BsonValue::Binary(self.read_binary()?),
            ElementType::Boolean => {
                let offset = self.reader.position();
                match self.reader.u8()? {
                    0 => BsonValue::Boolean(false),
                    1 => BsonValue::Boolean(true),
                    byte => return Err(DecodeError::InvalidBoolean { byte, offset }),
                }
            }
            ElementType::DateTime => {
                let offset = self.reader.position();
                let millis = self.reader.i64_le()?;
                let dt = DateTime::from_timestamp_millis(millis)
                    .ok_or(DecodeError::DateOutOfRange { millis, offset })?;
                BsonValue::DateTime(dt)
            }
            ElementType::Null => BsonValue::Null,
            ElementType::Int32 => BsonValue::Int32(self.reader.i32_le()?),
            ElementType::Int64 => BsonValue::Int64(self.reader.i64_le()?),
        })
    }

    fn read_string(&mut self) -> Result<String, DecodeError> {
        let offset = self.reader.position();
        let length = self.reader.i32_le()?;
        if length < 1 {
            return Err(DecodeError::InvalidLength {
                length: i64::from(length),
                offset,
            });
        }
        let s = self.reader.utf8(length as usize - 1)?;
        if s.contains('\0') {
            return Err(DecodeError::InvalidLength {
                length: i64::from(length),
                offset,
            });
        }
        let terminator = self.reader.position();
        if self.reader.u8()? != TERMINATOR {
            return Err(DecodeError::MissingTerminator { offset: terminator });
        }
        Ok(s.to_owned())
    }

    fn read_binary(&mut self) -> Result<Vec<u8>, DecodeError> {
        let offset = self.reader.position();
        let length = self.reader.i32_le()?;
        if length < 0 {
            return Err(DecodeError::InvalidLength {
                length: i64::from(length),
                offset,
            });
        }
        // Subtype byte: always written as 0, ignored on read.
        self.reader.u8()?;
        Ok(self.reader.buf(length as usize)?.to_vec())
    }
}

/// Rebuilds a sequence from an array-as-document.
///
/// Keys `"0".."n-1"` in order decode densely. Anything else raises
/// [`DiagnosticKind::SparseArray`]; when that is only recorded, numeric keys
/// are compacted in ascending index order and non-numeric keys dropped.
pub fn array_from_document(
    document: Document,
    path: &Path,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<BsonValue>, DecodeError> {
    let mismatch = document
        .keys()
        .enumerate()
        .find(|(index, key)| *key != index.to_string())
        .map(|(index, key)| (index.to_string(), key.to_owned()));

    let Some((expected, found)) = mismatch else {
        return Ok(document.into_iter().map(|(_, value)| value).collect());
    };
    diagnostics.report(path, DiagnosticKind::SparseArray { expected, found })?;

    let mut indexed: Vec<(usize, BsonValue)> = document
        .into_iter()
        .filter_map(|(key, value)| key.parse::<usize>().ok().map(|index| (index, value)))
        .collect();
    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, value)| value).collect())
}
