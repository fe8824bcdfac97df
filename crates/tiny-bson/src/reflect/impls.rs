//! [`BsonType`] for std and chrono types.

use std::any::{type_name, Any};
use std::collections::VecDeque;

use chrono::{DateTime, FixedOffset, Local, SubsecRound, Utc};

use super::{downcast, BsonType, Kind, NullableShape, Reflect, SequenceShape, Shape};
use crate::error::{DecodeError, EncodeError};
use crate::value::{BsonValue, Document};

/// Raw bytes, written as a binary element.
///
/// `Vec<u8>` is described as a sequence like any other `Vec<T>` and only
/// gets the binary tag through the encoder [`TypeRegistry::new`] installs.
/// `ByteBuf` is binary under every registry.
///
/// [`TypeRegistry::new`]: crate::TypeRegistry::new
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ByteBuf(pub Vec<u8>);

impl From<Vec<u8>> for ByteBuf {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for ByteBuf {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl BsonType for ByteBuf {
    fn shape_of() -> Shape {
        Shape::of::<Self>(Kind::Binary)
    }

    fn to_bson(&self) -> Result<BsonValue, EncodeError> {
        Ok(BsonValue::Binary(self.0.clone()))
    }

    fn from_bson(raw: BsonValue) -> Result<Self, BsonValue> {
        match raw {
            BsonValue::Binary(bytes) => Ok(Self(bytes)),
            raw => Err(raw),
        }
    }
}

impl BsonType for f64 {
    fn shape_of() -> Shape {
        Shape::of::<Self>(Kind::Double)
    }

    fn to_bson(&self) -> Result<BsonValue, EncodeError> {
        Ok(BsonValue::Double(*self))
    }

    fn from_bson(raw: BsonValue) -> Result<Self, BsonValue> {
        match raw {
            BsonValue::Double(v) => Ok(v),
            raw => Err(raw),
        }
    }
}

impl BsonType for f32 {
    fn shape_of() -> Shape {
        Shape::of::<Self>(Kind::Double)
    }

    fn to_bson(&self) -> Result<BsonValue, EncodeError> {
        Ok(BsonValue::Double(f64::from(*self)))
    }
}

impl BsonType for String {
    fn shape_of() -> Shape {
        Shape::of::<Self>(Kind::String)
    }

    fn to_bson(&self) -> Result<BsonValue, EncodeError> {
        Ok(BsonValue::Str(self.clone()))
    }

    fn from_bson(raw: BsonValue) -> Result<Self, BsonValue> {
        match raw {
            BsonValue::Str(s) => Ok(s),
            raw => Err(raw),
        }
    }
}

impl BsonType for bool {
    fn shape_of() -> Shape {
        Shape::of::<Self>(Kind::Boolean)
    }

    fn to_bson(&self) -> Result<BsonValue, EncodeError> {
        Ok(BsonValue::Boolean(*self))
    }

    fn from_bson(raw: BsonValue) -> Result<Self, BsonValue> {
        match raw {
            BsonValue::Boolean(b) => Ok(b),
            raw => Err(raw),
        }
    }
}

impl BsonType for i32 {
    fn shape_of() -> Shape {
        Shape::of::<Self>(Kind::Int32)
    }

    fn to_bson(&self) -> Result<BsonValue, EncodeError> {
        Ok(BsonValue::Int32(*self))
    }

    fn from_bson(raw: BsonValue) -> Result<Self, BsonValue> {
        match raw {
            BsonValue::Int32(v) => Ok(v),
            raw => Err(raw),
        }
    }
}

impl BsonType for i64 {
    fn shape_of() -> Shape {
        Shape::of::<Self>(Kind::Int64)
    }

    fn to_bson(&self) -> Result<BsonValue, EncodeError> {
        Ok(BsonValue::Int64(*self))
    }

    fn from_bson(raw: BsonValue) -> Result<Self, BsonValue> {
        match raw {
            BsonValue::Int64(v) => Ok(v),
            raw => Err(raw),
        }
    }
}

// Narrower and unsigned integers share a wire width with i32/i64 and are
// range-checked on the way out. The way back is a registry coercion.
macro_rules! checked_int {
    ($kind:ident, $wire:ident, $target:literal: $($ty:ty),*) => {$(
        impl BsonType for $ty {
            fn shape_of() -> Shape {
                Shape::of::<Self>(Kind::$kind)
            }

            fn to_bson(&self) -> Result<BsonValue, EncodeError> {
                $wire::try_from(*self)
                    .map(BsonValue::$kind)
                    .map_err(|_| EncodeError::overflow(self, $target))
            }
        }
    )*};
}

checked_int!(Int32, i32, "int32": i8, i16, u8, u16, u32);
checked_int!(Int64, i64, "int64": u64, usize, isize);

macro_rules! unsupported {
    ($($ty:ty),*) => {$(
        impl BsonType for $ty {
            fn shape_of() -> Shape {
                Shape::opaque::<Self>()
            }
        }
    )*};
}

unsupported!(char, i128, u128);

impl BsonType for DateTime<Utc> {
    fn shape_of() -> Shape {
        Shape::of::<Self>(Kind::DateTime)
    }

    fn to_bson(&self) -> Result<BsonValue, EncodeError> {
        Ok(BsonValue::DateTime(self.trunc_subsecs(3)))
    }

    fn from_bson(raw: BsonValue) -> Result<Self, BsonValue> {
        match raw {
            BsonValue::DateTime(dt) => Ok(dt),
            raw => Err(raw),
        }
    }
}

impl BsonType for DateTime<FixedOffset> {
    fn shape_of() -> Shape {
        Shape::of::<Self>(Kind::DateTime)
    }

    fn to_bson(&self) -> Result<BsonValue, EncodeError> {
        self.with_timezone(&Utc).to_bson()
    }
}

impl BsonType for DateTime<Local> {
    fn shape_of() -> Shape {
        Shape::of::<Self>(Kind::DateTime)
    }

    fn to_bson(&self) -> Result<BsonValue, EncodeError> {
        self.with_timezone(&Utc).to_bson()
    }
}

impl BsonType for () {
    fn shape_of() -> Shape {
        Shape::of::<Self>(Kind::Null)
    }

    fn to_bson(&self) -> Result<BsonValue, EncodeError> {
        Ok(BsonValue::Null)
    }

    fn from_bson(raw: BsonValue) -> Result<Self, BsonValue> {
        match raw {
            BsonValue::Null => Ok(()),
            raw => Err(raw),
        }
    }
}

impl BsonType for BsonValue {
    fn shape_of() -> Shape {
        Shape::of::<Self>(Kind::Any)
    }

    fn to_bson(&self) -> Result<BsonValue, EncodeError> {
        Ok(self.clone())
    }

    fn from_bson(raw: BsonValue) -> Result<Self, BsonValue> {
        Ok(raw)
    }
}

impl BsonType for Document {
    fn shape_of() -> Shape {
        Shape::of::<Self>(Kind::Document)
    }

    fn to_bson(&self) -> Result<BsonValue, EncodeError> {
        Ok(BsonValue::Document(self.clone()))
    }

    fn from_bson(raw: BsonValue) -> Result<Self, BsonValue> {
        match raw {
            BsonValue::Document(document) => Ok(document),
            raw => Err(raw),
        }
    }
}

impl<T: BsonType> BsonType for Option<T> {
    fn shape_of() -> Shape {
        Shape::of::<Self>(Kind::Nullable(NullableShape {
            inner: T::shape_of,
            get: option_get::<T>,
            wrap: option_wrap::<T>,
        }))
    }

    fn from_bson(raw: BsonValue) -> Result<Self, BsonValue> {
        match raw {
            BsonValue::Null => Ok(None),
            raw => T::from_bson(raw).map(Some),
        }
    }
}

fn option_get<T: BsonType>(value: &dyn Any) -> Option<&dyn Reflect> {
    value
        .downcast_ref::<Option<T>>()?
        .as_ref()
        .map(|inner| inner as &dyn Reflect)
}

fn option_wrap<T: BsonType>(inner: Box<dyn Reflect>) -> Result<Box<dyn Reflect>, DecodeError> {
    let inner = downcast::<T>(inner)?;
    Ok(Box::new(Some(inner)) as Box<dyn Reflect>)
}

impl<T: BsonType> BsonType for Vec<T> {
    fn shape_of() -> Shape {
        Shape::of::<Self>(Kind::Sequence(SequenceShape {
            element: T::shape_of,
            fixed_len: None,
            elements: vec_elements::<T>,
            push: Some(vec_push::<T>),
            slot: vec_slot::<T>,
        }))
    }
}

fn vec_elements<T: BsonType>(value: &dyn Any) -> Vec<&dyn Reflect> {
    match value.downcast_ref::<Vec<T>>() {
        Some(items) => items.iter().map(|item| item as &dyn Reflect).collect(),
        None => Vec::new(),
    }
}

fn vec_push<T: BsonType>(value: &mut dyn Any, item: Box<dyn Reflect>) -> Result<(), DecodeError> {
    let items = value
        .downcast_mut::<Vec<T>>()
        .ok_or_else(|| DecodeError::Custom(format!("not a {}", type_name::<Vec<T>>())))?;
    items.push(downcast::<T>(item)?);
    Ok(())
}

fn vec_slot<T: BsonType>(value: &mut dyn Any, index: usize) -> Option<&mut dyn Reflect> {
    value
        .downcast_mut::<Vec<T>>()?
        .get_mut(index)
        .map(|item| item as &mut dyn Reflect)
}

impl<T: BsonType> BsonType for VecDeque<T> {
    fn shape_of() -> Shape {
        Shape::of::<Self>(Kind::Sequence(SequenceShape {
            element: T::shape_of,
            fixed_len: None,
            elements: deque_elements::<T>,
            push: Some(deque_push::<T>),
            slot: deque_slot::<T>,
        }))
    }
}

fn deque_elements<T: BsonType>(value: &dyn Any) -> Vec<&dyn Reflect> {
    match value.downcast_ref::<VecDeque<T>>() {
        Some(items) => items.iter().map(|item| item as &dyn Reflect).collect(),
        None => Vec::new(),
    }
}

fn deque_push<T: BsonType>(value: &mut dyn Any, item: Box<dyn Reflect>) -> Result<(), DecodeError> {
    let items = value
        .downcast_mut::<VecDeque<T>>()
        .ok_or_else(|| DecodeError::Custom(format!("not a {}", type_name::<VecDeque<T>>())))?;
    items.push_back(downcast::<T>(item)?);
    Ok(())
}

fn deque_slot<T: BsonType>(value: &mut dyn Any, index: usize) -> Option<&mut dyn Reflect> {
    value
        .downcast_mut::<VecDeque<T>>()?
        .get_mut(index)
        .map(|item| item as &mut dyn Reflect)
}

impl<T: BsonType, const N: usize> BsonType for [T; N]
where
    [T; N]: Default,
{
    fn shape_of() -> Shape {
        Shape::of::<Self>(Kind::Sequence(SequenceShape {
            element: T::shape_of,
            fixed_len: Some(N),
            elements: array_elements::<T, N>,
            push: None,
            slot: array_slot::<T, N>,
        }))
    }
}

fn array_elements<T: BsonType, const N: usize>(value: &dyn Any) -> Vec<&dyn Reflect> {
    match value.downcast_ref::<[T; N]>() {
        Some(items) => items.iter().map(|item| item as &dyn Reflect).collect(),
        None => Vec::new(),
    }
}

fn array_slot<T: BsonType, const N: usize>(
    value: &mut dyn Any,
    index: usize,
) -> Option<&mut dyn Reflect> {
    value
        .downcast_mut::<[T; N]>()?
        .get_mut(index)
        .map(|item| item as &mut dyn Reflect)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn checked_integers() {
        assert_eq!(200u8.to_bson(), Ok(BsonValue::Int32(200)));
        assert_eq!(u32::MAX.to_bson(), Err(EncodeError::overflow(u32::MAX, "int32")));
        assert_eq!(7usize.to_bson(), Ok(BsonValue::Int64(7)));
        assert!(u64::MAX.to_bson().is_err());
    }

    #[test]
    fn unsupported_types_fail() {
        assert!(matches!(
            'x'.to_bson(),
            Err(EncodeError::Unsupported { type_name: "char", .. })
        ));
        assert!(matches!(u128::shape_of().kind, Kind::Unsupported));
    }

    #[test]
    fn datetimes_normalize_to_utc_millis() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let local = offset
            .with_ymd_and_hms(2024, 3, 1, 12, 0, 0)
            .unwrap()
            .checked_add_signed(chrono::Duration::microseconds(1_500))
            .unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
            + chrono::Duration::milliseconds(1);
        assert_eq!(local.to_bson(), Ok(BsonValue::DateTime(expected)));
    }

    #[test]
    fn option_identity() {
        assert_eq!(Option::<i32>::from_bson(BsonValue::Null), Ok(None));
        assert_eq!(Option::<i32>::from_bson(BsonValue::Int32(3)), Ok(Some(3)));
        assert!(Option::<i32>::from_bson(BsonValue::Str("x".into())).is_err());
    }

    #[test]
    fn sequence_access() {
        let shape = Vec::<i32>::shape_of();
        let Kind::Sequence(seq) = shape.kind else {
            panic!("not a sequence");
        };
        let mut items = vec![1, 2];
        assert_eq!((seq.elements)(&items).len(), 2);
        (seq.push.unwrap())(&mut items, Box::new(3i32)).unwrap();
        assert_eq!(items, [1, 2, 3]);
        assert!((seq.push.unwrap())(&mut items, Box::new(1i64)).is_err());

        let mut fixed = [0i32; 2];
        let Kind::Sequence(seq) = <[i32; 2]>::shape_of().kind else {
            panic!("not a sequence");
        };
        assert!(seq.push.is_none());
        (seq.slot)(&mut fixed, 1)
            .unwrap()
            .assign(Box::new(9i32))
            .unwrap();
        assert_eq!(fixed, [0, 9]);
        assert!((seq.slot)(&mut fixed, 2).is_none());
    }
}
