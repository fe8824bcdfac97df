//! Host type description.
//!
//! Rust has no runtime reflection, so every type the codec can map carries a
//! static [`Shape`]: its identity, its wire kind and a few type-erased entry
//! points (default construction, identity decode, element/field access).
//!
//! [`BsonType`] is the static side implemented per host type. [`Reflect`] is
//! the object-safe dynamic side, blanket-implemented for every `BsonType`, and
//! is what the registry and the mapper pass around.

mod impls;
mod macros;
mod schema;

use std::any::{type_name, Any, TypeId};
use std::fmt;

pub use impls::ByteBuf;
pub use schema::{demangle, mangle, FieldBinding, Getter, GetterMut, ObjectSchema, SchemaBuilder};

use crate::constants::ElementType;
use crate::error::{DecodeError, EncodeError};
use crate::registry::Capability;
use crate::value::BsonValue;

/// A host type the codec knows how to describe.
pub trait BsonType: Any + Default {
    fn shape_of() -> Shape;

    /// Scalar payload of this value.
    ///
    /// Only consulted for scalar kinds; objects, sequences and nullables are
    /// walked structurally.
    fn to_bson(&self) -> Result<BsonValue, EncodeError> {
        Err(EncodeError::unsupported(type_name::<Self>()))
    }

    /// Identity decode: succeeds when the raw wire value already is this
    /// type, handing the raw value back otherwise.
    fn from_bson(raw: BsonValue) -> Result<Self, BsonValue> {
        Err(raw)
    }
}

/// Object-safe view of a [`BsonType`] value.
pub trait Reflect: Any {
    fn shape(&self) -> Shape;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
    /// Replaces `self` with `value` if both are the same type.
    fn assign(&mut self, value: Box<dyn Reflect>) -> Result<(), DecodeError>;
    fn native_value(&self) -> Result<BsonValue, EncodeError>;
}

impl<T: BsonType> Reflect for T {
    fn shape(&self) -> Shape {
        T::shape_of()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn assign(&mut self, value: Box<dyn Reflect>) -> Result<(), DecodeError> {
        *self = downcast::<T>(value)?;
        Ok(())
    }

    fn native_value(&self) -> Result<BsonValue, EncodeError> {
        self.to_bson()
    }
}

impl<'a> dyn Reflect + 'a {
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }

    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut()
    }
}

impl<'a> fmt::Debug for dyn Reflect + 'a {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.shape().name)
    }
}

/// Unboxes a decoded value into its concrete type.
pub fn downcast<T: BsonType>(value: Box<dyn Reflect>) -> Result<T, DecodeError> {
    let found = value.shape().name;
    value
        .into_any()
        .downcast::<T>()
        .map(|boxed| *boxed)
        .map_err(|_| DecodeError::Mismatch {
            expected: type_name::<T>(),
            found,
        })
}

/// Static description of a host type.
#[derive(Clone, Copy)]
pub struct Shape {
    pub id: TypeId,
    pub name: &'static str,
    pub kind: Kind,
    /// Capability markers for registry dispatch.
    pub markers: &'static [&'static str],
    pub new_default: fn() -> Box<dyn Reflect>,
    pub from_native: fn(BsonValue) -> Result<Box<dyn Reflect>, BsonValue>,
}

fn new_default<T: BsonType>() -> Box<dyn Reflect> {
    Box::new(T::default())
}

fn from_native<T: BsonType>(raw: BsonValue) -> Result<Box<dyn Reflect>, BsonValue> {
    T::from_bson(raw).map(|value| Box::new(value) as Box<dyn Reflect>)
}

impl Shape {
    pub fn of<T: BsonType>(kind: Kind) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            kind,
            markers: &[],
            new_default: new_default::<T>,
            from_native: from_native::<T>,
        }
    }

    /// A structurally mapped type described by `describe`.
    pub fn object<T: BsonType>(describe: fn() -> ObjectSchema) -> Self {
        Self::of::<T>(Kind::Object(ObjectShape { describe }))
    }

    /// A type with no wire representation. Encoding it fails.
    pub fn opaque<T: BsonType>() -> Self {
        Self::of::<T>(Kind::Unsupported)
    }

    pub fn with_markers(mut self, markers: &'static [&'static str]) -> Self {
        self.markers = markers;
        self
    }

    /// The tag a value of this shape is written with.
    ///
    /// `None` for [`Kind::Any`], whose tag depends on the value, and for
    /// [`Kind::Unsupported`].
    pub fn element_type(&self) -> Option<ElementType> {
        Some(match self.kind {
            Kind::Double => ElementType::Double,
            Kind::String => ElementType::String,
            Kind::Binary => ElementType::Binary,
            Kind::Boolean => ElementType::Boolean,
            Kind::DateTime => ElementType::DateTime,
            Kind::Null => ElementType::Null,
            Kind::Int32 => ElementType::Int32,
            Kind::Int64 => ElementType::Int64,
            Kind::Document | Kind::Object(_) => ElementType::Document,
            Kind::Sequence(_) => ElementType::Array,
            Kind::Nullable(nullable) => return (nullable.inner)().element_type(),
            Kind::Any | Kind::Unsupported => return None,
        })
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        match capability {
            Capability::Nullable => matches!(self.kind, Kind::Nullable(_)),
            Capability::Sequence => matches!(self.kind, Kind::Sequence(_)),
            Capability::Object => matches!(self.kind, Kind::Object(_)),
            Capability::Marker(marker) => self.markers.contains(&marker),
        }
    }

    /// Whether a wire null is a legal value of this shape.
    pub fn accepts_null(&self) -> bool {
        matches!(self.kind, Kind::Nullable(_) | Kind::Null | Kind::Any)
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shape")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("markers", &self.markers)
            .finish()
    }
}

/// Wire kind of a host type.
#[derive(Clone, Copy)]
pub enum Kind {
    Double,
    String,
    Binary,
    Boolean,
    DateTime,
    Null,
    Int32,
    Int64,
    /// A dynamic [`Document`](crate::Document).
    Document,
    /// A dynamic [`BsonValue`]; any tag.
    Any,
    Nullable(NullableShape),
    Sequence(SequenceShape),
    Object(ObjectShape),
    Unsupported,
}

impl fmt::Debug for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Double => f.write_str("Double"),
            Self::String => f.write_str("String"),
            Self::Binary => f.write_str("Binary"),
            Self::Boolean => f.write_str("Boolean"),
            Self::DateTime => f.write_str("DateTime"),
            Self::Null => f.write_str("Null"),
            Self::Int32 => f.write_str("Int32"),
            Self::Int64 => f.write_str("Int64"),
            Self::Document => f.write_str("Document"),
            Self::Any => f.write_str("Any"),
            Self::Nullable(nullable) => write!(f, "Nullable({})", (nullable.inner)().name),
            Self::Sequence(sequence) => match sequence.fixed_len {
                Some(len) => write!(f, "Sequence([{}; {len}])", (sequence.element)().name),
                None => write!(f, "Sequence({})", (sequence.element)().name),
            },
            Self::Object(_) => f.write_str("Object"),
            Self::Unsupported => f.write_str("Unsupported"),
        }
    }
}

/// `Option`-like wrapper around an inner shape.
#[derive(Clone, Copy)]
pub struct NullableShape {
    pub inner: fn() -> Shape,
    /// The wrapped value, `None` when empty.
    pub get: for<'a> fn(&'a dyn Any) -> Option<&'a dyn Reflect>,
    /// Wraps a decoded inner value.
    pub wrap: fn(Box<dyn Reflect>) -> Result<Box<dyn Reflect>, DecodeError>,
}

pub type ElementsFn = for<'a> fn(&'a dyn Any) -> Vec<&'a dyn Reflect>;
pub type PushFn = fn(&mut dyn Any, Box<dyn Reflect>) -> Result<(), DecodeError>;
pub type SlotFn = for<'a> fn(&'a mut dyn Any, usize) -> Option<&'a mut dyn Reflect>;

/// Homogeneous collection.
#[derive(Clone, Copy)]
pub struct SequenceShape {
    pub element: fn() -> Shape,
    /// `Some(n)` for fixed-size arrays.
    pub fixed_len: Option<usize>,
    pub elements: ElementsFn,
    /// Append; `None` for fixed-size arrays.
    pub push: Option<PushFn>,
    pub slot: SlotFn,
}

#[derive(Clone, Copy)]
pub struct ObjectShape {
    pub describe: fn() -> ObjectSchema,
}
