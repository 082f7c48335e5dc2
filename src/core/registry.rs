// Closed variant sets: one descriptor per registered slot, built once per sum type.
// Discriminators are unique within a set; `poly_enum!` checks this at compile
// time through `assert_unique_names`, the builder checks it again at runtime.
use crate::core::error::{Error, ErrorKind, Operation};
use crate::core::poly::Member;
use crate::core::variant::{Ownership, Slot, Variant};
use crate::json::parse;
use serde_json::{Map, Value};
use std::any::{TypeId, type_name};
use std::fmt;

/// One registered variant of the sum type `V`.
pub struct VariantDescriptor<V> {
    name: &'static str,
    type_id: TypeId,
    rust_type: &'static str,
    ownership: Ownership,
    decode: fn(Map<String, Value>) -> Result<V, Error>,
    patch: fn(&mut V, Map<String, Value>) -> Result<(), Error>,
}

fn decode_fresh<V, S>(fields: Map<String, Value>) -> Result<V, Error>
where
    V: Member<S>,
    S: Slot,
{
    let target = parse::decode::<S::Target>(Value::Object(fields))
        .map_err(|err| Error::new(ErrorKind::Codec).with_source(err))?;
    Ok(<V as Member<S>>::wrap(S::from_target(target)))
}

fn patch_slot<V, S>(held: &mut V, fields: Map<String, Value>) -> Result<(), Error>
where
    V: Member<S>,
    S: Slot,
{
    let Some(slot) = <V as Member<S>>::slot_mut(held) else {
        return Err(Error::new(ErrorKind::UnknownVariant)
            .with_message(format!("held value is not stored as {}", type_name::<S>())));
    };
    Slot::patch(slot, fields).map_err(|err| Error::new(ErrorKind::Codec).with_source(err))
}

impl<V> VariantDescriptor<V> {
    fn of<S>() -> Self
    where
        V: Member<S>,
        S: Slot,
    {
        Self {
            name: <S::Target as Variant>::TYPE_NAME,
            type_id: TypeId::of::<S::Target>(),
            rust_type: type_name::<S::Target>(),
            ownership: S::OWNERSHIP,
            decode: decode_fresh::<V, S>,
            patch: patch_slot::<V, S>,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn rust_type(&self) -> &'static str {
        self.rust_type
    }

    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    pub(crate) fn decode(&self, fields: Map<String, Value>) -> Result<V, Error> {
        (self.decode)(fields)
    }

    pub(crate) fn patch(&self, held: &mut V, fields: Map<String, Value>) -> Result<(), Error> {
        (self.patch)(held, fields)
    }
}

impl<V> fmt::Debug for VariantDescriptor<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariantDescriptor")
            .field("name", &self.name)
            .field("rust_type", &self.rust_type)
            .field("ownership", &self.ownership)
            .finish()
    }
}

/// Ordered, closed set of variants for the sum type `V`.
pub struct VariantSet<V> {
    descriptors: Vec<VariantDescriptor<V>>,
}

impl<V> VariantSet<V> {
    pub fn builder() -> VariantSetBuilder<V> {
        VariantSetBuilder {
            descriptors: Vec::new(),
        }
    }

    pub fn find(&self, name: &str) -> Option<&VariantDescriptor<V>> {
        self.descriptors
            .iter()
            .find(|descriptor| descriptor.name == name)
    }

    pub fn find_type<T: 'static>(&self) -> Option<&VariantDescriptor<V>> {
        let type_id = TypeId::of::<T>();
        self.descriptors
            .iter()
            .find(|descriptor| descriptor.type_id == type_id)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VariantDescriptor<V>> {
        self.descriptors.iter()
    }

    /// Discriminators in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.descriptors.iter().map(|descriptor| descriptor.name)
    }
}

impl<V> fmt::Debug for VariantSet<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.descriptors.iter()).finish()
    }
}

pub struct VariantSetBuilder<V> {
    descriptors: Vec<VariantDescriptor<V>>,
}

impl<V> VariantSetBuilder<V> {
    pub fn variant<S>(mut self) -> Self
    where
        V: Member<S>,
        S: Slot,
    {
        self.descriptors.push(VariantDescriptor::of::<S>());
        self
    }

    pub fn try_build(self) -> Result<VariantSet<V>, Error> {
        for (index, descriptor) in self.descriptors.iter().enumerate() {
            if descriptor.name.is_empty() {
                return Err(Error::new(ErrorKind::MissingIdentity)
                    .with_op(Operation::Register)
                    .with_message(format!("{} has an empty discriminator", descriptor.rust_type)));
            }
            if let Some(earlier) = self.descriptors[..index]
                .iter()
                .find(|earlier| earlier.name == descriptor.name)
            {
                return Err(Error::new(ErrorKind::DuplicateVariant)
                    .with_op(Operation::Register)
                    .with_variant(descriptor.name)
                    .with_message(format!(
                        "{} and {} share a discriminator",
                        earlier.rust_type, descriptor.rust_type
                    )));
            }
        }
        tracing::debug!(variants = self.descriptors.len(), "built variant set");
        Ok(VariantSet {
            descriptors: self.descriptors,
        })
    }

    /// Builds the set, panicking on an empty or duplicate discriminator.
    pub fn build(self) -> VariantSet<V> {
        match self.try_build() {
            Ok(set) => set,
            Err(err) => panic!("invalid variant set: {err}"),
        }
    }
}

/// Compile-time check used by `poly_enum!`: every name non-empty and unique.
pub const fn assert_unique_names(names: &[&str]) {
    let mut i = 0;
    while i < names.len() {
        if names[i].is_empty() {
            panic!("variant set contains an empty discriminator");
        }
        let mut j = i + 1;
        while j < names.len() {
            if str_eq(names[i], names[j]) {
                panic!("variant set contains a duplicate discriminator");
            }
            j += 1;
        }
        i += 1;
    }
}

const fn str_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    let mut i = 0;
    while i < a.len() {
        if a[i] != b[i] {
            return false;
        }
        i += 1;
    }
    true
}
