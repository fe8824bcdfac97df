//! Field-by-field mapping of object shapes.

use crate::diagnostics::DiagnosticKind;
use crate::error::{DecodeError, EncodeError};
use crate::reflect::{Kind, ObjectSchema, Reflect, Shape};
use crate::value::{BsonValue, Document};

use super::{decode_value, encode_value, DecodeContext, EncodeContext};

/// Writes every schema field under its wire name, in schema order.
pub fn encode_object(
    value: &dyn Reflect,
    cx: &mut EncodeContext<'_>,
) -> Result<BsonValue, EncodeError> {
    let shape = value.shape();
    let schema = cx
        .registry
        .schema(&shape)
        .ok_or(EncodeError::NotADocument(shape.name))?;

    let mut document = Document::with_capacity(schema.fields().len());
    for field in schema.fields() {
        let member = field.value_of(value.as_any()).ok_or_else(|| {
            EncodeError::Custom(format!(
                "field `{}` does not belong to {}",
                field.name, shape.name
            ))
        })?;
        cx.path.push_key(field.wire_name);
        let encoded = encode_value(member, cx);
        cx.path.pop();
        document.insert(field.wire_name, encoded?);
    }
    Ok(BsonValue::Document(document))
}

/// The default fallback decoder.
///
/// Starts from the type's default and assigns each wire entry to the field it
/// addresses. Unknown and transient keys are reported, fields that fail to
/// decode keep their default.
pub fn decode_object(
    shape: &Shape,
    raw: BsonValue,
    cx: &mut DecodeContext<'_>,
) -> Result<Box<dyn Reflect>, DecodeError> {
    if !matches!(shape.kind, Kind::Object(_)) {
        return Err(DecodeError::mismatch(shape.name, &raw));
    }
    let BsonValue::Document(document) = raw else {
        return Err(DecodeError::mismatch(shape.name, &raw));
    };
    let schema = cx
        .registry
        .schema(shape)
        .ok_or_else(|| DecodeError::mismatch(shape.name, &BsonValue::Null))?;

    let mut instance = (shape.new_default)();
    for (key, value) in document {
        cx.path.push_key(key.as_str());
        let outcome = decode_field(&schema, instance.as_mut(), key, value, cx);
        cx.path.pop();
        outcome?;
    }
    Ok(instance)
}

fn decode_field(
    schema: &ObjectSchema,
    instance: &mut dyn Reflect,
    key: String,
    value: BsonValue,
    cx: &mut DecodeContext<'_>,
) -> Result<(), DecodeError> {
    if schema.is_transient(&key) {
        return cx.report(DiagnosticKind::TransientField {
            key,
            type_name: schema.type_name(),
        });
    }
    let Some(field) = schema.field(&key) else {
        return cx.report(DiagnosticKind::UnknownField {
            key,
            type_name: schema.type_name(),
        });
    };

    let assigned = decode_value(value, &(field.shape)(), cx).and_then(|decoded| {
        field
            .slot_of(instance.as_any_mut())
            .ok_or_else(|| {
                DecodeError::Custom(format!(
                    "field `{}` does not belong to {}",
                    field.name,
                    schema.type_name()
                ))
            })?
            .assign(decoded)
    });
    match assigned {
        Ok(()) => Ok(()),
        Err(err) => cx.recover(err),
    }
}
