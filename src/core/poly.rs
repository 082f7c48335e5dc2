// Polymorphic container and its marshal/unmarshal protocol.
// Encode splices `"type"` in front of the variant's own fields. Decode either
// replaces the held value (new or different discriminator) or patches it in
// place (same discriminator), and commits only after the codec succeeded.
use crate::core::error::{Error, ErrorKind, Operation};
use crate::core::registry::VariantSet;
use crate::core::variant::Slot;
use crate::json::parse;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de, ser};
use serde_json::{Map, Value};

/// Name of the discriminator field on the wire.
pub const TYPE_FIELD: &str = "type";

/// Capability shared by every closed sum type a `Poly` can hold.
///
/// Usually implemented by `poly_enum!`; hand-written impls may return `None`
/// from `type_name` or hold arms that are not part of `variants()`, and the
/// container reports those as errors rather than guessing.
pub trait PolyValue: Sized + 'static {
    /// Discriminator of the held variant.
    fn type_name(&self) -> Option<&'static str>;

    /// The held variant's own fields, or `None` for a null handle.
    fn encode_fields(&self) -> Result<Option<Value>, serde_json::Error>;

    fn variants() -> &'static VariantSet<Self>;

    fn is_null(&self) -> bool {
        false
    }
}

/// Links a sum type to one of its slot types.
pub trait Member<S: Slot>: PolyValue {
    fn wrap(slot: S) -> Self;

    fn slot_mut(&mut self) -> Option<&mut S>;
}

/// Whether an object without `type` may patch the held variant.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum DiscriminatorPolicy {
    /// Reuse the held variant's discriminator when `type` is absent.
    #[default]
    Inherit,
    /// Every non-null object must carry `type`.
    Require,
}

#[derive(Clone, Debug)]
pub struct DecodeOptions {
    pub discriminator: DiscriminatorPolicy,
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self {
            discriminator: DiscriminatorPolicy::Inherit,
        }
    }

    pub fn require_discriminator() -> Self {
        Self {
            discriminator: DiscriminatorPolicy::Require,
        }
    }
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Container holding at most one value of the closed sum type `V`.
#[derive(Clone, Debug, PartialEq)]
pub struct Poly<V> {
    value: Option<V>,
}

impl<V> Poly<V> {
    pub fn new() -> Self {
        Self { value: None }
    }

    pub fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    pub fn value_mut(&mut self) -> Option<&mut V> {
        self.value.as_mut()
    }

    pub fn set(&mut self, value: impl Into<V>) {
        self.value = Some(value.into());
    }

    pub fn take(&mut self) -> Option<V> {
        self.value.take()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }

    pub fn into_inner(self) -> Option<V> {
        self.value
    }
}

impl<V> Default for Poly<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> From<V> for Poly<V> {
    fn from(value: V) -> Self {
        Self { value: Some(value) }
    }
}

fn encode_error(kind: ErrorKind) -> Error {
    Error::new(kind).with_op(Operation::Encode)
}

fn decode_error(kind: ErrorKind) -> Error {
    Error::new(kind).with_op(Operation::Decode)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl<V: PolyValue> Poly<V> {
    pub fn from_slice(input: &[u8]) -> Result<Self, Error> {
        let mut poly = Self::new();
        poly.decode(input)?;
        Ok(poly)
    }

    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        let value = self.encode_value()?;
        parse::to_vec(&value).map_err(|err| encode_error(ErrorKind::Codec).with_source(err))
    }

    /// Encodes to `{"type": <name>, ..fields}`, or `null` when empty.
    pub fn encode_value(&self) -> Result<Value, Error> {
        let Some(value) = &self.value else {
            return Ok(Value::Null);
        };
        let fields = value.encode_fields().map_err(|err| {
            let err = encode_error(ErrorKind::Codec).with_source(err);
            match value.type_name() {
                Some(name) => err.with_variant(name),
                None => err,
            }
        })?;
        let Some(fields) = fields else {
            return Ok(Value::Null);
        };

        let name = value.type_name().ok_or_else(|| {
            encode_error(ErrorKind::MissingIdentity)
                .with_message("held value exposes no discriminator")
        })?;
        if V::variants().find(name).is_none() {
            return Err(encode_error(ErrorKind::UnknownVariant)
                .with_message("discriminator is not registered")
                .with_variant(name));
        }

        let fields = match fields {
            Value::Object(fields) => fields,
            other => {
                return Err(encode_error(ErrorKind::Codec)
                    .with_message(format!(
                        "variant fields must encode as an object, found {}",
                        json_kind(&other)
                    ))
                    .with_variant(name));
            }
        };
        if fields.contains_key(TYPE_FIELD) {
            return Err(encode_error(ErrorKind::ReservedField)
                .with_message("variant encodes its own `type` field")
                .with_variant(name));
        }

        let mut object = Map::with_capacity(fields.len() + 1);
        object.insert(TYPE_FIELD.to_string(), Value::String(name.to_string()));
        object.extend(fields);
        Ok(Value::Object(object))
    }

    pub fn decode(&mut self, input: &[u8]) -> Result<(), Error> {
        self.decode_with(input, &DecodeOptions::default())
    }

    pub fn decode_with(&mut self, input: &[u8], options: &DecodeOptions) -> Result<(), Error> {
        let value = parse::from_slice(input).map_err(|err| {
            decode_error(ErrorKind::Codec)
                .with_message("input is not valid JSON")
                .with_source(err)
        })?;
        self.decode_value(value, options)
    }

    /// Applies one decoded JSON value to the container.
    ///
    /// `null` empties the container. An object whose discriminator differs from
    /// the held one (or with nothing held) replaces it with a fresh variant;
    /// a matching discriminator patches the held variant, keeping every field
    /// the object omits. On error the container is left as it was.
    pub fn decode_value(&mut self, input: Value, options: &DecodeOptions) -> Result<(), Error> {
        let mut fields = match input {
            Value::Null => {
                if self.value.take().is_some() {
                    tracing::trace!("cleared polymorphic value");
                }
                return Ok(());
            }
            Value::Object(fields) => fields,
            other => {
                return Err(decode_error(ErrorKind::Codec).with_message(format!(
                    "expected an object or null, found {}",
                    json_kind(&other)
                )));
            }
        };

        // A null handle has nothing to patch and behaves like an empty container.
        let current = match &self.value {
            Some(value) if !value.is_null() => Some(value.type_name().ok_or_else(|| {
                decode_error(ErrorKind::MissingIdentity)
                    .with_message("held value exposes no discriminator")
            })?),
            _ => None,
        };

        let incoming = match fields.shift_remove(TYPE_FIELD) {
            Some(Value::String(name)) if !name.is_empty() => name,
            Some(Value::String(_)) => {
                return Err(decode_error(ErrorKind::MissingDiscriminator)
                    .with_message("`type` is empty"));
            }
            Some(Value::Null) | None => match (options.discriminator, current) {
                (DiscriminatorPolicy::Inherit, Some(current)) => current.to_string(),
                _ => {
                    return Err(decode_error(ErrorKind::MissingDiscriminator)
                        .with_message("missing discriminator `type`"));
                }
            },
            Some(other) => {
                return Err(decode_error(ErrorKind::Codec).with_message(format!(
                    "`type` must be a string, found {}",
                    json_kind(&other)
                )));
            }
        };

        let Some(descriptor) = V::variants().find(&incoming) else {
            return Err(decode_error(ErrorKind::UnknownVariant)
                .with_message("discriminator is not registered")
                .with_variant(incoming));
        };
        let name = descriptor.name();

        match self.value.as_mut() {
            Some(held) if current == Some(name) => {
                tracing::trace!(variant = name, ownership = ?descriptor.ownership(), "patching held variant");
                descriptor
                    .patch(held, fields)
                    .map_err(|err| err.with_op(Operation::Decode).with_variant(name))?;
            }
            _ => {
                tracing::trace!(variant = name, previous = ?current, "decoding fresh variant");
                let fresh = descriptor
                    .decode(fields)
                    .map_err(|err| err.with_op(Operation::Decode).with_variant(name))?;
                self.value = Some(fresh);
            }
        }
        Ok(())
    }
}

impl<V: PolyValue> Serialize for Poly<V> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.encode_value()
            .map_err(<S::Error as ser::Error>::custom)?
            .serialize(serializer)
    }
}

impl<'de, V: PolyValue> Deserialize<'de> for Poly<V> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut poly = Self::new();
        Self::deserialize_in_place(deserializer, &mut poly)?;
        Ok(poly)
    }

    fn deserialize_in_place<D>(deserializer: D, place: &mut Self) -> Result<(), D::Error>
    where
        D: Deserializer<'de>,
    {
        let input = Value::deserialize(deserializer)?;
        place
            .decode_value(input, &DecodeOptions::default())
            .map_err(<D::Error as de::Error>::custom)
    }
}
