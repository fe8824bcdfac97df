//! Compact BSON-style binary object codec.
//!
//! Host values are mapped to a tagged, length-framed document format and back.
//! Which conversion applies to a type is resolved at runtime through a
//! [`TypeRegistry`]: exact per-type bindings first, then capability decoders
//! (nullable, sequence, custom markers), then structural field-by-field
//! mapping driven by each type's [`ObjectSchema`].
//!
//! ```
//! use tiny_bson::bson_object;
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Person {
//!     name: String,
//!     age: i32,
//! }
//!
//! bson_object!(Person { name, age });
//!
//! let alice = Person { name: "Alice".into(), age: 30 };
//! let bytes = tiny_bson::encode(&alice).unwrap();
//! let decoded = tiny_bson::decode::<Person>(&bytes).unwrap();
//! assert_eq!(decoded.value, alice);
//! ```
//!
//! Decoding is lenient by default: wire entries that do not fit their target
//! leave the field at its default and are reported in
//! [`Decoded::diagnostics`]. [`DecodePolicy::Strict`] turns the first such
//! condition into an error. Malformed bytes always fail.

mod codec;
mod constants;
mod diagnostics;
mod error;
mod json;
mod reflect;
mod value;

pub mod mapper;
pub mod registry;
pub mod wire;

pub use codec::{Codec, CodecOptions, Decoded};
pub use constants::{ElementType, DEFAULT_MAX_DEPTH};
pub use diagnostics::{DecodePolicy, Diagnostic, DiagnosticKind, Diagnostics, Path, Segment};
pub use error::{DecodeError, EncodeError};
pub use mapper::{DecodeContext, EncodeContext};
pub use reflect::{
    demangle, downcast, mangle, BsonType, ByteBuf, ElementsFn, FieldBinding, Getter, GetterMut,
    Kind, NullableShape, ObjectSchema, ObjectShape, PushFn, Reflect, SchemaBuilder, SequenceShape,
    Shape, SlotFn,
};
pub use registry::{Binding, Capability, RegistryError, TypeKey, TypeRegistry};
pub use value::{BsonValue, Document};

/// Encodes `value` as one top-level document using the global registry.
pub fn encode(value: &dyn Reflect) -> Result<Vec<u8>, EncodeError> {
    Codec::new(registry::global()).encode(value)
}

/// Decodes one top-level document into `T` using the global registry.
pub fn decode<T: BsonType>(data: &[u8]) -> Result<Decoded<T>, DecodeError> {
    Codec::new(registry::global()).decode(data)
}
