//! Explicit, ordered field lists for structurally mapped types.

use std::any::{type_name, Any};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use super::{BsonType, Kind, Reflect, Shape};

const BACKING_FIELD_SUFFIX: &str = ">k__BackingField";

/// Storage name of the backing slot for a logical property name.
///
/// ```
/// assert_eq!(tiny_bson::mangle("Age"), "<Age>k__BackingField");
/// ```
pub fn mangle(name: &str) -> String {
    format!("<{name}{BACKING_FIELD_SUFFIX}")
}

/// Logical property name of a backing slot; other names pass through.
///
/// ```
/// assert_eq!(tiny_bson::demangle("<Age>k__BackingField"), "Age");
/// assert_eq!(tiny_bson::demangle("age"), "age");
/// ```
pub fn demangle(name: &str) -> &str {
    name.strip_prefix('<')
        .and_then(|rest| rest.strip_suffix(BACKING_FIELD_SUFFIX))
        .filter(|logical| !logical.is_empty())
        .unwrap_or(name)
}

pub type Getter = Arc<dyn for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Reflect> + Send + Sync>;
pub type GetterMut =
    Arc<dyn for<'a> Fn(&'a mut dyn Any) -> Option<&'a mut dyn Reflect> + Send + Sync>;

fn getter<G>(get: G) -> Getter
where
    G: for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Reflect> + Send + Sync + 'static,
{
    Arc::new(get)
}

fn getter_mut<G>(get_mut: G) -> GetterMut
where
    G: for<'a> Fn(&'a mut dyn Any) -> Option<&'a mut dyn Reflect> + Send + Sync + 'static,
{
    Arc::new(get_mut)
}

/// One serialized field.
#[derive(Clone)]
pub struct FieldBinding {
    /// Storage name as declared.
    pub name: &'static str,
    /// Key written on the wire: the storage name, demangled.
    pub wire_name: &'static str,
    pub shape: fn() -> Shape,
    get: Getter,
    get_mut: GetterMut,
}

impl FieldBinding {
    /// Whether a wire key addresses this field: exact storage name, logical
    /// name, or the mangled form of the logical name.
    pub fn matches(&self, key: &str) -> bool {
        key == self.name || key == self.wire_name || demangle(key) == self.wire_name
    }

    /// Field value inside `object`, `None` if `object` is not the owning type.
    pub fn value_of<'a>(&self, object: &'a dyn Any) -> Option<&'a dyn Reflect> {
        (self.get)(object)
    }

    pub fn slot_of<'a>(&self, object: &'a mut dyn Any) -> Option<&'a mut dyn Reflect> {
        (self.get_mut)(object)
    }
}

impl fmt::Debug for FieldBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldBinding")
            .field("name", &self.name)
            .field("wire_name", &self.wire_name)
            .field("type", &(self.shape)().name)
            .finish()
    }
}

/// The flattened field list of one object type.
///
/// Own fields come first in declaration order, followed by the fields of each
/// `extends` base. Built once and reused for every encode and decode.
#[derive(Clone)]
pub struct ObjectSchema {
    type_name: &'static str,
    fields: Vec<FieldBinding>,
    transient: Vec<&'static str>,
}

impl ObjectSchema {
    pub fn builder<T: BsonType>() -> SchemaBuilder<T> {
        SchemaBuilder {
            fields: Vec::new(),
            bases: Vec::new(),
            transient: Vec::new(),
            _marker: PhantomData,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn fields(&self) -> &[FieldBinding] {
        &self.fields
    }

    /// The field a wire key addresses.
    pub fn field(&self, key: &str) -> Option<&FieldBinding> {
        self.fields.iter().find(|field| field.matches(key))
    }

    pub fn transient(&self) -> &[&'static str] {
        &self.transient
    }

    pub fn is_transient(&self, key: &str) -> bool {
        let key = demangle(key);
        self.transient.iter().any(|name| demangle(name) == key)
    }
}

impl fmt::Debug for ObjectSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectSchema")
            .field("type_name", &self.type_name)
            .field("fields", &self.fields)
            .field("transient", &self.transient)
            .finish()
    }
}

pub struct SchemaBuilder<T> {
    fields: Vec<FieldBinding>,
    bases: Vec<FieldBinding>,
    transient: Vec<&'static str>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: BsonType> SchemaBuilder<T> {
    /// Adds a serialized field of type `F`.
    pub fn field<F, G, M>(mut self, name: &'static str, get: G, get_mut: M) -> Self
    where
        F: BsonType,
        G: for<'a> Fn(&'a T) -> &'a F + Send + Sync + 'static,
        M: for<'a> Fn(&'a mut T) -> &'a mut F + Send + Sync + 'static,
    {
        self.fields.push(FieldBinding {
            name,
            wire_name: demangle(name),
            shape: F::shape_of,
            get: getter(move |object| {
                object
                    .downcast_ref::<T>()
                    .map(|owner| get(owner) as &dyn Reflect)
            }),
            get_mut: getter_mut(move |object| {
                object
                    .downcast_mut::<T>()
                    .map(|owner| get_mut(owner) as &mut dyn Reflect)
            }),
        });
        self
    }

    /// Declares a field that is never encoded nor decoded.
    pub fn transient(mut self, name: &'static str) -> Self {
        self.transient.push(name);
        self
    }

    /// Flattens the fields of an embedded base object into this schema.
    ///
    /// Base fields follow the own fields; a base field whose wire name is
    /// already taken by an own field is dropped. Bases that are not objects
    /// contribute nothing.
    pub fn extends<B, G, M>(mut self, get: G, get_mut: M) -> Self
    where
        B: BsonType,
        G: for<'a> Fn(&'a T) -> &'a B + Send + Sync + 'static,
        M: for<'a> Fn(&'a mut T) -> &'a mut B + Send + Sync + 'static,
    {
        let Kind::Object(base) = B::shape_of().kind else {
            tracing::debug!(
                target: "tiny_bson::schema",
                owner = type_name::<T>(),
                base = type_name::<B>(),
                "extends target is not an object, ignored"
            );
            return self;
        };
        let schema = (base.describe)();
        let get = Arc::new(get);
        let get_mut = Arc::new(get_mut);

        for field in schema.fields {
            let (outer, inner) = (get.clone(), field.get.clone());
            let (outer_mut, inner_mut) = (get_mut.clone(), field.get_mut.clone());
            self.bases.push(FieldBinding {
                get: getter(move |object| {
                    let owner = object.downcast_ref::<T>()?;
                    inner(outer(owner) as &dyn Any)
                }),
                get_mut: getter_mut(move |object| {
                    let owner = object.downcast_mut::<T>()?;
                    inner_mut(outer_mut(owner) as &mut dyn Any)
                }),
                ..field
            });
        }
        self.transient.extend(schema.transient);
        self
    }

    pub fn build(self) -> ObjectSchema {
        let SchemaBuilder {
            mut fields,
            bases,
            transient,
            ..
        } = self;
        for base in bases {
            if fields.iter().all(|own| own.wire_name != base.wire_name) {
                fields.push(base);
            }
        }
        ObjectSchema {
            type_name: type_name::<T>(),
            fields,
            transient,
        }
    }
}
