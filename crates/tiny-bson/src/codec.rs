//! Bytes in, typed values out, against an explicit registry.

use crate::constants::DEFAULT_MAX_DEPTH;
use crate::diagnostics::{DecodePolicy, Diagnostic, Diagnostics};
use crate::error::{DecodeError, EncodeError};
use crate::mapper::{encode_value, DecodeContext, EncodeContext};
use crate::reflect::{BsonType, Reflect};
use crate::registry::TypeRegistry;
use crate::value::{BsonValue, Document};
use crate::wire::{WireReader, WireWriter};

/// Options for a [`Codec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecOptions {
    pub policy: DecodePolicy,
    /// Maximum document nesting accepted on decode.
    pub max_depth: usize,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            policy: DecodePolicy::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// A decoded value with the recoverable conditions met along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<T> {
    pub value: T,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Decoded<T> {
    /// Whether decoding met no recoverable conditions.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

pub struct Codec<'r> {
    registry: &'r TypeRegistry,
    options: CodecOptions,
}

impl<'r> Codec<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self::with_options(registry, CodecOptions::default())
    }

    pub fn with_options(registry: &'r TypeRegistry, options: CodecOptions) -> Self {
        Self { registry, options }
    }

    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    /// Maps a value to its top-level document. Sequences become
    /// array-as-documents.
    pub fn to_document(&self, value: &dyn Reflect) -> Result<Document, EncodeError> {
        let mut cx = EncodeContext::new(self.registry);
        match encode_value(value, &mut cx)? {
            BsonValue::Document(document) => Ok(document),
            BsonValue::Array(items) => Ok(items
                .into_iter()
                .enumerate()
                .map(|(index, item)| (index.to_string(), item))
                .collect()),
            _ => Err(EncodeError::NotADocument(value.shape().name)),
        }
    }

    pub fn encode(&self, value: &dyn Reflect) -> Result<Vec<u8>, EncodeError> {
        let document = self.to_document(value)?;
        let bytes = WireWriter::new().encode(&document)?;
        tracing::trace!(
            target: "tiny_bson::codec",
            type_name = value.shape().name,
            bytes = bytes.len(),
            "encoded"
        );
        Ok(bytes)
    }

    /// Parses `data` as one top-level document without mapping it.
    pub fn decode_document(&self, data: &[u8]) -> Result<Decoded<Document>, DecodeError> {
        let mut diagnostics = Diagnostics::new(self.options.policy);
        let document = WireReader::new(data, &mut diagnostics)
            .with_max_depth(self.options.max_depth)
            .read_top_level()?;
        Ok(Decoded {
            value: document,
            diagnostics: diagnostics.into_vec(),
        })
    }

    pub fn decode<T: BsonType>(&self, data: &[u8]) -> Result<Decoded<T>, DecodeError> {
        let mut diagnostics = Diagnostics::new(self.options.policy);
        let document = WireReader::new(data, &mut diagnostics)
            .with_max_depth(self.options.max_depth)
            .read_top_level()?;
        let decoded = self.map_document::<T>(document, diagnostics)?;
        tracing::trace!(
            target: "tiny_bson::codec",
            type_name = std::any::type_name::<T>(),
            bytes = data.len(),
            diagnostics = decoded.diagnostics.len(),
            "decoded"
        );
        Ok(decoded)
    }

    /// Maps an already parsed document onto `T`.
    pub fn from_document<T: BsonType>(
        &self,
        document: Document,
    ) -> Result<Decoded<T>, DecodeError> {
        self.map_document(document, Diagnostics::new(self.options.policy))
    }

    fn map_document<T: BsonType>(
        &self,
        document: Document,
        diagnostics: Diagnostics,
    ) -> Result<Decoded<T>, DecodeError> {
        let mut cx = DecodeContext::new(self.registry, diagnostics);
        let value = cx.decode_as::<T>(BsonValue::Document(document))?;
        Ok(Decoded {
            value,
            diagnostics: cx.into_diagnostics().into_vec(),
        })
    }
}
