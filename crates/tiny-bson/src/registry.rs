//! Type-to-function registry.
//!
//! Bindings are resolved differently per direction:
//!
//! - decode: exact type, then capability decoders in priority order, then the
//!   structural fallback;
//! - encode: exact type, then the structural fallback. Capabilities are never
//!   consulted.
//!
//! A registry is populated up front and then shared immutably. The
//! process-wide instance behind [`global`] is set once through [`install`] or
//! defaults on first use.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Local};
use once_cell::sync::OnceCell;
use thiserror::Error;

use crate::error::{DecodeError, EncodeError};
use crate::mapper::{self, DecodeContext, EncodeContext};
use crate::reflect::{BsonType, Kind, ObjectSchema, Reflect, Shape};
use crate::value::BsonValue;

/// Produces the wire value of a host value.
pub type Encoder = Arc<
    dyn Fn(&dyn Reflect, &mut EncodeContext<'_>) -> Result<BsonValue, EncodeError> + Send + Sync,
>;

/// Produces a host value of the given shape from a raw wire value.
pub type Decoder = Arc<
    dyn Fn(&Shape, BsonValue, &mut DecodeContext<'_>) -> Result<Box<dyn Reflect>, DecodeError>
        + Send
        + Sync,
>;

/// A trait-like property a [`Shape`] may have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Nullable,
    Sequence,
    Object,
    /// Declared through [`Shape::with_markers`].
    Marker(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKey {
    Exact(TypeId),
    Capability(Capability),
    /// The structural fallback.
    Any,
}

impl TypeKey {
    pub fn of<T: 'static>() -> Self {
        Self::Exact(TypeId::of::<T>())
    }
}

#[derive(Clone)]
pub enum Binding {
    Encoder(Encoder),
    Decoder(Decoder),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("encoders cannot be keyed by capability {0:?}")]
    CapabilityEncoder(Capability),
    #[error("type `{0}` is not an object")]
    NotAnObject(&'static str),
}

#[derive(Clone)]
pub struct TypeRegistry {
    encoders: HashMap<TypeId, Encoder>,
    decoders: HashMap<TypeId, Decoder>,
    capability_decoders: Vec<(Capability, Decoder)>,
    fallback_encoder: Encoder,
    fallback_decoder: Decoder,
    schemas: HashMap<TypeId, Arc<ObjectSchema>>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Structural fallbacks, `[Nullable, Sequence]` capability decoders, the
    /// numeric and date coercions, and binary encoding for `Vec<u8>`.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register_capability_decoder(Capability::Nullable, mapper::decode_nullable);
        registry.register_capability_decoder(Capability::Sequence, mapper::decode_sequence);

        registry.register_decoder::<i8>(coerce_int::<i8>);
        registry.register_decoder::<i16>(coerce_int::<i16>);
        registry.register_decoder::<i32>(coerce_int::<i32>);
        registry.register_decoder::<u8>(coerce_int::<u8>);
        registry.register_decoder::<u16>(coerce_int::<u16>);
        registry.register_decoder::<u32>(coerce_int::<u32>);
        registry.register_decoder::<i64>(coerce_int::<i64>);
        registry.register_decoder::<u64>(coerce_int::<u64>);
        registry.register_decoder::<usize>(coerce_int::<usize>);
        registry.register_decoder::<isize>(coerce_int::<isize>);
        registry.register_decoder::<f64>(coerce_f64);
        registry.register_decoder::<f32>(coerce_f32);
        registry.register_encoder::<Vec<u8>>(|bytes, _| Ok(BsonValue::Binary(bytes.clone())));
        registry.register_decoder::<DateTime<FixedOffset>>(|raw, _| match raw {
            BsonValue::DateTime(dt) => Ok(dt.fixed_offset()),
            raw => Err(DecodeError::mismatch("datetime", &raw)),
        });
        registry.register_decoder::<DateTime<Local>>(|raw, _| match raw {
            BsonValue::DateTime(dt) => Ok(dt.with_timezone(&Local)),
            raw => Err(DecodeError::mismatch("datetime", &raw)),
        });
        registry
    }

    /// Only the structural fallbacks.
    pub fn empty() -> Self {
        Self {
            encoders: HashMap::new(),
            decoders: HashMap::new(),
            capability_decoders: Vec::new(),
            fallback_encoder: Arc::new(mapper::encode_structural),
            fallback_decoder: Arc::new(mapper::decode_object),
            schemas: HashMap::new(),
        }
    }

    /// Installs a binding, returning whether one was replaced.
    pub fn register(&mut self, key: TypeKey, binding: Binding) -> Result<bool, RegistryError> {
        let replaced = match (key, binding) {
            (TypeKey::Exact(id), Binding::Encoder(encoder)) => {
                self.encoders.insert(id, encoder).is_some()
            }
            (TypeKey::Exact(id), Binding::Decoder(decoder)) => {
                self.decoders.insert(id, decoder).is_some()
            }
            (TypeKey::Capability(capability), Binding::Encoder(_)) => {
                return Err(RegistryError::CapabilityEncoder(capability));
            }
            (TypeKey::Capability(capability), Binding::Decoder(decoder)) => {
                match self
                    .capability_decoders
                    .iter_mut()
                    .find(|(existing, _)| *existing == capability)
                {
                    Some(entry) => {
                        entry.1 = decoder;
                        true
                    }
                    None => {
                        self.capability_decoders.push((capability, decoder));
                        false
                    }
                }
            }
            (TypeKey::Any, Binding::Encoder(encoder)) => {
                self.fallback_encoder = encoder;
                true
            }
            (TypeKey::Any, Binding::Decoder(decoder)) => {
                self.fallback_decoder = decoder;
                true
            }
        };
        if replaced {
            tracing::warn!(target: "tiny_bson::registry", ?key, "binding replaced");
        } else {
            tracing::debug!(target: "tiny_bson::registry", ?key, "binding registered");
        }
        Ok(replaced)
    }

    fn register_infallible(&mut self, key: TypeKey, binding: Binding) -> bool {
        // Only capability-keyed encoders are rejected.
        self.register(key, binding).unwrap_or(false)
    }

    /// Exact encoder for `T`.
    pub fn register_encoder<T: BsonType>(
        &mut self,
        encode: impl Fn(&T, &mut EncodeContext<'_>) -> Result<BsonValue, EncodeError>
            + Send
            + Sync
            + 'static,
    ) -> bool {
        let encoder: Encoder = Arc::new(move |value: &dyn Reflect, cx: &mut EncodeContext<'_>| {
            let value = value
                .downcast_ref::<T>()
                .ok_or_else(|| EncodeError::Custom(format!("not a {}", type_name::<T>())))?;
            encode(value, cx)
        });
        tracing::debug!(target: "tiny_bson::registry", type_name = type_name::<T>(), "encoder");
        self.register_infallible(TypeKey::of::<T>(), Binding::Encoder(encoder))
    }

    /// Exact decoder for `T`.
    pub fn register_decoder<T: BsonType>(
        &mut self,
        decode: impl Fn(BsonValue, &mut DecodeContext<'_>) -> Result<T, DecodeError>
            + Send
            + Sync
            + 'static,
    ) -> bool {
        let decoder: Decoder = Arc::new(
            move |_: &Shape, raw: BsonValue, cx: &mut DecodeContext<'_>| {
                decode(raw, cx).map(|value| Box::new(value) as Box<dyn Reflect>)
            },
        );
        tracing::debug!(target: "tiny_bson::registry", type_name = type_name::<T>(), "decoder");
        self.register_infallible(TypeKey::of::<T>(), Binding::Decoder(decoder))
    }

    /// Decoder for every shape with `capability` that has no exact decoder.
    ///
    /// A new capability goes to the end of the priority list; re-registering
    /// keeps its position.
    pub fn register_capability_decoder<F>(&mut self, capability: Capability, decode: F) -> bool
    where
        F: Fn(&Shape, BsonValue, &mut DecodeContext<'_>) -> Result<Box<dyn Reflect>, DecodeError>
            + Send
            + Sync
            + 'static,
    {
        self.register_infallible(
            TypeKey::Capability(capability),
            Binding::Decoder(Arc::new(decode)),
        )
    }

    /// Moves the listed capabilities to the front of the priority list, in
    /// the given order. Unlisted capabilities keep their relative order.
    pub fn prioritize(&mut self, order: &[Capability]) {
        let rank = |capability: &Capability| {
            order
                .iter()
                .position(|c| c == capability)
                .unwrap_or(order.len())
        };
        self.capability_decoders
            .sort_by_key(|(capability, _)| rank(capability));
    }

    pub fn capability_priority(&self) -> Vec<Capability> {
        self.capability_decoders.iter().map(|(c, _)| *c).collect()
    }

    pub fn register_fallback_encoder<F>(&mut self, encode: F)
    where
        F: Fn(&dyn Reflect, &mut EncodeContext<'_>) -> Result<BsonValue, EncodeError>
            + Send
            + Sync
            + 'static,
    {
        self.register_infallible(TypeKey::Any, Binding::Encoder(Arc::new(encode)));
    }

    pub fn register_fallback_decoder<F>(&mut self, decode: F)
    where
        F: Fn(&Shape, BsonValue, &mut DecodeContext<'_>) -> Result<Box<dyn Reflect>, DecodeError>
            + Send
            + Sync
            + 'static,
    {
        self.register_infallible(TypeKey::Any, Binding::Decoder(Arc::new(decode)));
    }

    /// Captures the flattened schema of `T` once, for reuse by every call.
    pub fn register_object<T: BsonType>(&mut self) -> Result<bool, RegistryError> {
        let shape = T::shape_of();
        let Kind::Object(object) = shape.kind else {
            return Err(RegistryError::NotAnObject(shape.name));
        };
        let schema = (object.describe)();
        tracing::debug!(
            target: "tiny_bson::registry",
            type_name = shape.name,
            fields = schema.fields().len(),
            "object schema"
        );
        Ok(self
            .schemas
            .insert(shape.id, Arc::new(schema))
            .is_some())
    }

    pub fn encoder_for(&self, id: TypeId) -> Option<&Encoder> {
        self.encoders.get(&id)
    }

    pub fn fallback_encoder(&self) -> &Encoder {
        &self.fallback_encoder
    }

    pub fn decoder_for(&self, shape: &Shape) -> &Decoder {
        if let Some(decoder) = self.decoders.get(&shape.id) {
            return decoder;
        }
        self.capability_decoders
            .iter()
            .find(|(capability, _)| shape.has_capability(*capability))
            .map(|(_, decoder)| decoder)
            .unwrap_or(&self.fallback_decoder)
    }

    /// Schema of an object shape: the registered one, or a fresh description.
    pub fn schema(&self, shape: &Shape) -> Option<Arc<ObjectSchema>> {
        if let Some(schema) = self.schemas.get(&shape.id) {
            return Some(schema.clone());
        }
        match shape.kind {
            Kind::Object(object) => Some(Arc::new((object.describe)())),
            _ => None,
        }
    }
}

fn coerce_int<T>(raw: BsonValue, _: &mut DecodeContext<'_>) -> Result<T, DecodeError>
where
    T: BsonType + TryFrom<i64>,
{
    let value = raw
        .as_i64()
        .ok_or_else(|| DecodeError::mismatch(type_name::<T>(), &raw))?;
    T::try_from(value).map_err(|_| DecodeError::out_of_range(value, type_name::<T>()))
}

fn coerce_f64(raw: BsonValue, _: &mut DecodeContext<'_>) -> Result<f64, DecodeError> {
    match raw {
        BsonValue::Double(v) => Ok(v),
        BsonValue::Int32(v) => Ok(f64::from(v)),
        BsonValue::Int64(v) => Ok(v as f64),
        raw => Err(DecodeError::mismatch("f64", &raw)),
    }
}

fn coerce_f32(raw: BsonValue, cx: &mut DecodeContext<'_>) -> Result<f32, DecodeError> {
    let wide = coerce_f64(raw, cx).map_err(|err| match err {
        DecodeError::Mismatch { found, .. } => DecodeError::Mismatch {
            expected: "f32",
            found,
        },
        err => err,
    })?;
    let narrow = wide as f32;
    if wide.is_finite() && narrow.is_infinite() {
        return Err(DecodeError::out_of_range(wide, "f32"));
    }
    Ok(narrow)
}

static GLOBAL: OnceCell<TypeRegistry> = OnceCell::new();

/// Sets the process-wide registry. Fails, handing the registry back, once
/// one is in place (including the default installed by [`global`]).
pub fn install(registry: TypeRegistry) -> Result<(), TypeRegistry> {
    GLOBAL.set(registry)?;
    tracing::info!(target: "tiny_bson::registry", "global registry installed");
    Ok(())
}

/// The process-wide registry, defaulting to [`TypeRegistry::new`].
pub fn global() -> &'static TypeRegistry {
    GLOBAL.get_or_init(TypeRegistry::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;

    fn decode_with<T: BsonType>(registry: &TypeRegistry, raw: BsonValue) -> Result<T, DecodeError> {
        let mut cx = DecodeContext::new(registry, Diagnostics::default());
        cx.decode_as::<T>(raw)
    }

    #[test]
    fn capability_encoders_are_rejected() {
        let mut registry = TypeRegistry::new();
        let encoder: Encoder =
            Arc::new(|_: &dyn Reflect, _: &mut EncodeContext<'_>| Ok(BsonValue::Null));
        assert_eq!(
            registry.register(
                TypeKey::Capability(Capability::Sequence),
                Binding::Encoder(encoder)
            ),
            Err(RegistryError::CapabilityEncoder(Capability::Sequence))
        );
    }

    #[test]
    fn reregistration_reports_replacement() {
        let mut registry = TypeRegistry::empty();
        assert!(!registry.register_decoder::<i32>(|_, _| Ok(1)));
        assert!(registry.register_decoder::<i32>(|_, _| Ok(2)));
        assert_eq!(decode_with::<i32>(&registry, BsonValue::Int64(0)), Ok(2));
    }

    #[test]
    fn default_priority() {
        let registry = TypeRegistry::new();
        assert_eq!(
            registry.capability_priority(),
            [Capability::Nullable, Capability::Sequence]
        );
    }

    #[test]
    fn prioritize_reorders() {
        let mut registry = TypeRegistry::new();
        registry.register_capability_decoder(Capability::Marker("tagged"), mapper::decode_object);
        registry.prioritize(&[Capability::Marker("tagged")]);
        assert_eq!(
            registry.capability_priority(),
            [
                Capability::Marker("tagged"),
                Capability::Nullable,
                Capability::Sequence
            ]
        );
    }

    #[test]
    fn integer_coercions() {
        let registry = TypeRegistry::new();
        assert_eq!(decode_with::<i64>(&registry, BsonValue::Int32(5)), Ok(5));
        assert_eq!(decode_with::<u8>(&registry, BsonValue::Int32(255)), Ok(255));
        assert_eq!(
            decode_with::<u8>(&registry, BsonValue::Int32(256)),
            Err(DecodeError::out_of_range(256, "u8"))
        );
        assert_eq!(decode_with::<i32>(&registry, BsonValue::Int64(-7)), Ok(-7));
        assert!(decode_with::<u64>(&registry, BsonValue::Int64(-1)).is_err());
        assert_eq!(decode_with::<f64>(&registry, BsonValue::Int32(2)), Ok(2.0));
        assert_eq!(decode_with::<f32>(&registry, BsonValue::Double(0.5)), Ok(0.5));
        assert!(decode_with::<f32>(&registry, BsonValue::Double(1e300)).is_err());
    }

    #[test]
    fn byte_vectors_encode_as_binary() {
        let registry = TypeRegistry::new();
        let mut cx = EncodeContext::new(&registry);
        assert_eq!(
            mapper::encode_value(&vec![1u8, 2, 3], &mut cx),
            Ok(BsonValue::Binary(vec![1, 2, 3]))
        );
        assert_eq!(
            decode_with::<Vec<u8>>(&registry, BsonValue::Binary(vec![9])),
            Ok(vec![9])
        );

        let bare = TypeRegistry::empty();
        let mut cx = EncodeContext::new(&bare);
        assert_eq!(
            mapper::encode_value(&vec![1u8], &mut cx),
            Ok(BsonValue::Array(vec![BsonValue::Int32(1)]))
        );
    }

    #[test]
    fn empty_registry_has_no_coercions() {
        let registry = TypeRegistry::empty();
        assert!(decode_with::<i64>(&registry, BsonValue::Int32(5)).is_err());
        assert!(decode_with::<Option<i32>>(&registry, BsonValue::Int32(1)).is_ok());
    }

    #[test]
    fn register_object_requires_object() {
        let mut registry = TypeRegistry::new();
        assert_eq!(
            registry.register_object::<i32>(),
            Err(RegistryError::NotAnObject("i32"))
        );
    }
}
