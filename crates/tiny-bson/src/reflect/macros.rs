/// Implements [`BsonType`](crate::BsonType) for a struct mapped field by field.
///
/// Fields are listed in wire order. `transient` names fields that are never
/// encoded nor decoded, `extends` names an embedded struct whose fields are
/// flattened after the own fields, and `markers` attaches capability markers
/// for registry dispatch.
///
/// ```
/// use tiny_bson::bson_object;
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Entity {
///     id: i64,
/// }
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Person {
///     name: String,
///     age: i32,
///     scratch: String,
///     entity: Entity,
/// }
///
/// bson_object!(Entity { id });
/// bson_object!(Person { name, age } transient { scratch } extends entity);
///
/// let person = Person {
///     name: "Alice".into(),
///     age: 30,
///     scratch: "x".into(),
///     entity: Entity { id: 7 },
/// };
/// let bytes = tiny_bson::encode(&person).unwrap();
/// let decoded = tiny_bson::decode::<Person>(&bytes).unwrap().value;
/// assert_eq!(decoded.name, "Alice");
/// assert_eq!(decoded.entity.id, 7);
/// assert_eq!(decoded.scratch, "");
/// ```
#[macro_export]
macro_rules! bson_object {
    (
        $ty:ty { $($field:ident),* $(,)? }
        $(transient { $($skip:ident),* $(,)? })?
        $(extends $base:ident)?
        $(markers [$($marker:expr),* $(,)?])?
    ) => {
        impl $crate::BsonType for $ty {
            fn shape_of() -> $crate::Shape {
                fn describe() -> $crate::ObjectSchema {
                    $crate::ObjectSchema::builder::<$ty>()
                        $(.field(
                            stringify!($field),
                            |value: &$ty| &value.$field,
                            |value: &mut $ty| &mut value.$field,
                        ))*
                        $($(.transient(stringify!($skip)))*)?
                        $(.extends(
                            |value: &$ty| &value.$base,
                            |value: &mut $ty| &mut value.$base,
                        ))?
                        .build()
                }
                $crate::Shape::object::<$ty>(describe)
                    $(.with_markers(&[$($marker),*]))?
            }
        }
    };
}
