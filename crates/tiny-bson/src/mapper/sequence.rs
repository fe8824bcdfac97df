//! Mapping of sequence shapes to and from arrays.

use std::any::Any;

use crate::diagnostics::DiagnosticKind;
use crate::error::{DecodeError, EncodeError};
use crate::reflect::{Kind, Reflect, SequenceShape, Shape};
use crate::value::BsonValue;
use crate::wire::array_from_document;

use super::{decode_value, encode_value, DecodeContext, EncodeContext};

/// Writes every element in iteration order.
pub fn encode_sequence(
    value: &dyn Reflect,
    sequence: &SequenceShape,
    cx: &mut EncodeContext<'_>,
) -> Result<BsonValue, EncodeError> {
    let elements = (sequence.elements)(value.as_any());
    let mut items = Vec::with_capacity(elements.len());
    for (index, element) in elements.into_iter().enumerate() {
        cx.path.push_index(index);
        let encoded = encode_value(element, cx);
        cx.path.pop();
        items.push(encoded?);
    }
    Ok(BsonValue::Array(items))
}

/// Default decoder for sequence shapes.
///
/// Accepts an array, an array-as-document, or (for integer elements) a binary
/// payload. Every entry keeps its position: a null for a non-nullable element
/// type, or an entry that fails to decode, leaves that position at the
/// element type's default. Fixed-size arrays report a length mismatch, keep
/// defaults for missing positions and drop extra entries.
pub fn decode_sequence(
    shape: &Shape,
    raw: BsonValue,
    cx: &mut DecodeContext<'_>,
) -> Result<Box<dyn Reflect>, DecodeError> {
    let Kind::Sequence(sequence) = shape.kind else {
        return Err(DecodeError::mismatch(shape.name, &raw));
    };
    let element = (sequence.element)();
    let items = match raw {
        BsonValue::Array(items) => items,
        BsonValue::Document(document) => {
            array_from_document(document, &cx.path, &mut cx.diagnostics)?
        }
        BsonValue::Binary(bytes) if matches!(element.kind, Kind::Int32) => {
            bytes.into_iter().map(|b| BsonValue::Int32(i32::from(b))).collect()
        }
        raw => return Err(DecodeError::mismatch(shape.name, &raw)),
    };

    if let Some(expected) = sequence.fixed_len {
        if items.len() != expected {
            cx.report(DiagnosticKind::LengthMismatch {
                expected,
                found: items.len(),
            })?;
        }
    }

    let mut instance = (shape.new_default)();
    let capacity = sequence.fixed_len.unwrap_or(usize::MAX);
    for (index, item) in items.into_iter().take(capacity).enumerate() {
        cx.path.push_index(index);
        let decoded = decode_element(&element, item, cx);
        cx.path.pop();
        place(&sequence, instance.as_any_mut(), index, decoded?)?;
    }
    Ok(instance)
}

fn decode_element(
    element: &Shape,
    item: BsonValue,
    cx: &mut DecodeContext<'_>,
) -> Result<Box<dyn Reflect>, DecodeError> {
    if item.is_null() && !element.accepts_null() {
        cx.report(DiagnosticKind::NullElement {
            element: element.name,
        })?;
        return Ok((element.new_default)());
    }
    match decode_value(item, element, cx) {
        Ok(value) => Ok(value),
        Err(err) => {
            cx.recover(err)?;
            Ok((element.new_default)())
        }
    }
}

fn place(
    sequence: &SequenceShape,
    target: &mut dyn Any,
    index: usize,
    value: Box<dyn Reflect>,
) -> Result<(), DecodeError> {
    if let Some(push) = sequence.push {
        return push(target, value);
    }
    match (sequence.slot)(target, index) {
        Some(slot) => slot.assign(value),
        None => Err(DecodeError::Custom(format!("no slot at position {index}"))),
    }
}
