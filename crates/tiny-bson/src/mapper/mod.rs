//! Structural mapping between host values and [`BsonValue`]s.
//!
//! Registry lookups happen per value, so a custom binding for a nested field
//! type takes effect wherever that type appears.

mod object;
mod sequence;

pub use object::{decode_object, encode_object};
pub use sequence::{decode_sequence, encode_sequence};

use crate::diagnostics::{DiagnosticKind, Diagnostics, Path};
use crate::error::{DecodeError, EncodeError};
use crate::reflect::{downcast, BsonType, Kind, Reflect, Shape};
use crate::registry::TypeRegistry;
use crate::value::BsonValue;

/// State threaded through one encode call.
pub struct EncodeContext<'r> {
    registry: &'r TypeRegistry,
    path: Path,
}

impl<'r> EncodeContext<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self {
            registry,
            path: Path::new(),
        }
    }

    pub fn registry(&self) -> &'r TypeRegistry {
        self.registry
    }

    /// Location of the value being encoded.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Encodes a nested value through the registry.
    pub fn encode(&mut self, value: &dyn Reflect) -> Result<BsonValue, EncodeError> {
        encode_value(value, self)
    }
}

/// State threaded through one decode call.
pub struct DecodeContext<'r> {
    registry: &'r TypeRegistry,
    diagnostics: Diagnostics,
    path: Path,
}

impl<'r> DecodeContext<'r> {
    pub fn new(registry: &'r TypeRegistry, diagnostics: Diagnostics) -> Self {
        Self {
            registry,
            diagnostics,
            path: Path::new(),
        }
    }

    pub fn registry(&self) -> &'r TypeRegistry {
        self.registry
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    /// Decodes a nested value through the registry.
    pub fn decode(
        &mut self,
        raw: BsonValue,
        shape: &Shape,
    ) -> Result<Box<dyn Reflect>, DecodeError> {
        decode_value(raw, shape, self)
    }

    pub fn decode_as<T: BsonType>(&mut self, raw: BsonValue) -> Result<T, DecodeError> {
        downcast(decode_value(raw, &T::shape_of(), self)?)
    }

    /// Records a recoverable condition at the current location.
    pub fn report(&mut self, kind: DiagnosticKind) -> Result<(), DecodeError> {
        self.diagnostics.report(&self.path, kind)
    }

    /// Absorbs a failure at the current location per policy.
    pub fn recover(&mut self, err: DecodeError) -> Result<(), DecodeError> {
        self.diagnostics.recover(&self.path, err)
    }
}

/// Encodes one value: exact registry binding, else the fallback.
pub fn encode_value(
    value: &dyn Reflect,
    cx: &mut EncodeContext<'_>,
) -> Result<BsonValue, EncodeError> {
    let registry = cx.registry;
    let shape = value.shape();
    match registry.encoder_for(shape.id) {
        Some(encoder) => encoder(value, cx),
        None => (registry.fallback_encoder())(value, cx),
    }
}

/// The default fallback encoder: dispatch on the value's kind.
pub fn encode_structural(
    value: &dyn Reflect,
    cx: &mut EncodeContext<'_>,
) -> Result<BsonValue, EncodeError> {
    let shape = value.shape();
    match shape.kind {
        Kind::Object(_) => encode_object(value, cx),
        Kind::Sequence(sequence) => encode_sequence(value, &sequence, cx),
        Kind::Nullable(nullable) => match (nullable.get)(value.as_any()) {
            Some(inner) => encode_value(inner, cx),
            None => Ok(BsonValue::Null),
        },
        Kind::Unsupported => Err(EncodeError::Unsupported {
            type_name: shape.name,
            path: cx.path.to_string(),
        }),
        _ => value.native_value().map_err(|err| err.at(&cx.path)),
    }
}

/// Decodes `raw` into a value of `shape`.
///
/// A raw value that already is the target type is taken as is. Otherwise the
/// registry picks a decoder, and its result must be of the target type.
pub fn decode_value(
    raw: BsonValue,
    shape: &Shape,
    cx: &mut DecodeContext<'_>,
) -> Result<Box<dyn Reflect>, DecodeError> {
    let raw = match (shape.from_native)(raw) {
        Ok(value) => return Ok(value),
        Err(raw) => raw,
    };
    if raw.is_null() && !shape.accepts_null() {
        return Err(DecodeError::UnexpectedNull { target: shape.name });
    }

    let registry = cx.registry;
    let decoder = registry.decoder_for(shape);
    let value = decoder(shape, raw, cx)?;
    let found = value.shape();
    if found.id != shape.id {
        return Err(DecodeError::Mismatch {
            expected: shape.name,
            found: found.name,
        });
    }
    Ok(value)
}

/// Default decoder for nullable shapes.
pub fn decode_nullable(
    shape: &Shape,
    raw: BsonValue,
    cx: &mut DecodeContext<'_>,
) -> Result<Box<dyn Reflect>, DecodeError> {
    let Kind::Nullable(nullable) = shape.kind else {
        return Err(DecodeError::mismatch(shape.name, &raw));
    };
    if raw.is_null() {
        return Ok((shape.new_default)());
    }
    let inner = decode_value(raw, &(nullable.inner)(), cx)?;
    (nullable.wrap)(inner)
}
