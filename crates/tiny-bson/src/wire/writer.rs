//! Document → bytes.

use tiny_bson_buffers::Writer;

use crate::constants::{BINARY_SUBTYPE_GENERIC, TERMINATOR};
use crate::error::EncodeError;
use crate::value::{BsonValue, Document};

/// Serializes [`Document`]s into the tagged wire format.
///
/// Frames are written with a placeholder length that is patched once the
/// terminator is in place, so no payload is staged twice. The length counts
/// every byte after the length field itself, terminator included.
pub struct WireWriter {
    pub writer: Writer,
}

impl Default for WireWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl WireWriter {
    pub fn new() -> Self {
        Self {
            writer: Writer::new(),
        }
    }

    /// Encodes one top-level document.
    pub fn encode(&mut self, document: &Document) -> Result<Vec<u8>, EncodeError> {
        self.writer.reset();
        self.write_document(document)?;
        Ok(self.writer.flush())
    }

    /// Encodes a sequence as a top-level array-as-document.
    pub fn encode_array(&mut self, items: &[BsonValue]) -> Result<Vec<u8>, EncodeError> {
        self.writer.reset();
        self.write_array(items)?;
        Ok(self.writer.flush())
    }

    pub fn write_document(&mut self, document: &Document) -> Result<(), EncodeError> {
        let slot = self.writer.reserve_i32();
        for (name, value) in document.iter() {
            self.write_element(name, value)?;
        }
        self.close_frame(slot)
    }

    /// Writes a sequence as a document keyed `"0"`, `"1"`, ... in order.
    pub fn write_array(&mut self, items: &[BsonValue]) -> Result<(), EncodeError> {
        let slot = self.writer.reserve_i32();
        for (index, value) in items.iter().enumerate() {
            self.write_element(&index.to_string(), value)?;
        }
        self.close_frame(slot)
    }

    fn close_frame(&mut self, slot: usize) -> Result<(), EncodeError> {
        self.writer.u8(TERMINATOR);
        let length = self.writer.len() - slot - 4;
        let length = i32::try_from(length).map_err(|_| EncodeError::TooLarge(length))?;
        self.writer
            .patch_i32(slot, length)
            .map_err(|e| EncodeError::Custom(e.to_string()))
    }

    /// Writes tag, name and payload of one element.
    pub fn write_element(&mut self, name: &str, value: &BsonValue) -> Result<(), EncodeError> {
        self.writer.u8(value.element_type() as u8);
        self.write_cstring(name)?;
        match value {
            BsonValue::Double(v) => self.writer.f64_le(*v),
            BsonValue::Str(s) => self.write_string(s)?,
            BsonValue::Document(d) => self.write_document(d)?,
            BsonValue::Array(items) => self.write_array(items)?,
            BsonValue::Binary(data) => self.write_binary(data)?,
            BsonValue::Boolean(b) => self.writer.u8(u8::from(*b)),
            BsonValue::DateTime(dt) => self.writer.i64_le(dt.timestamp_millis()),
            BsonValue::Null => {}
            BsonValue::Int32(v) => self.writer.i32_le(*v),
            BsonValue::Int64(v) => self.writer.i64_le(*v),
        }
        Ok(())
    }

    /// Element name: raw UTF-8 followed by NUL, no length prefix.
    pub fn write_cstring(&mut self, name: &str) -> Result<(), EncodeError> {
        if name.is_empty() || name.as_bytes().contains(&0) {
            return Err(EncodeError::InvalidName(name.to_owned()));
        }
        self.writer.utf8(name);
        self.writer.u8(TERMINATOR);
        Ok(())
    }

    /// String payload: int32 (byte count + 1), UTF-8 bytes, NUL.
    pub fn write_string(&mut self, s: &str) -> Result<(), EncodeError> {
        let bytes = s.as_bytes();
        if bytes.contains(&0) {
            return Err(EncodeError::EmbeddedNul);
        }
        let length =
            i32::try_from(bytes.len() + 1).map_err(|_| EncodeError::TooLarge(bytes.len()))?;
        self.writer.i32_le(length);
        self.writer.buf(bytes);
        self.writer.u8(TERMINATOR);
        Ok(())
    }

    /// Binary payload: int32 byte count, subtype byte, raw bytes.
    pub fn write_binary(&mut self, data: &[u8]) -> Result<(), EncodeError> {
        let length = i32::try_from(data.len()).map_err(|_| EncodeError::TooLarge(data.len()))?;
        self.writer.i32_le(length);
        self.writer.u8(BINARY_SUBTYPE_GENERIC);
        self.writer.buf(data);
        Ok(())
    }
}
