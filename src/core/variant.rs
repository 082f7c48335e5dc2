// Variant identity plus the two ownership strategies a container slot can use.
// Value slots patch a scratch copy and store it back; handle slots write the
// patched value through the existing handle so every holder observes it.
use crate::json::merge::merge_patch;
use crate::json::parse;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A concrete type that may be held by a polymorphic container.
///
/// `TYPE_NAME` is the discriminator written to the `type` field. It must be
/// non-empty, and the variant's own fields must not include one named `type`.
///
/// A same-type decode calls [`Variant::patch`]. The provided patch goes
/// through the variant's JSON form: it encodes `self`, merges the incoming
/// fields over it, and decodes the result. Two kinds of state do not survive
/// that trip, and a variant holding either should override `patch`:
///
/// - fields serde never writes (`#[serde(skip)]`, `skip_serializing`) come
///   back as their defaults;
/// - a nested `Poly` field is rebuilt from JSON, so a `Shared` handle inside
///   it is replaced by a new referent instead of being patched through.
///
/// An override usually starts from [`Variant::merged`] for the plain fields,
/// copies the non-serialized state across, and feeds nested containers to
/// `Poly::decode_value` last:
///
/// ```
/// use polyjson::{DecodeOptions, Poly, Shared, Variant, poly_enum};
/// use serde::{Deserialize, Serialize};
/// use serde_json::{Map, Value};
///
/// #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
/// struct Leaf {
///     #[serde(default)]
///     key: String,
/// }
///
/// impl Variant for Leaf {
///     const TYPE_NAME: &'static str = "leaf";
/// }
///
/// poly_enum! {
///     #[derive(Clone, Debug, PartialEq)]
///     enum Child {
///         Leaf(Shared<Leaf>),
///     }
/// }
///
/// #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// struct Branch {
///     #[serde(default)]
///     child: Poly<Child>,
///     #[serde(skip)]
///     hits: u32,
/// }
///
/// impl Variant for Branch {
///     const TYPE_NAME: &'static str = "branch";
///
///     fn patch(&mut self, mut fields: Map<String, Value>) -> Result<(), serde_json::Error> {
///         let child = fields.shift_remove("child");
///         let mut next = self.merged(fields)?;
///         next.hits = self.hits;
///         next.child = self.child.clone();
///         if let Some(child) = child {
///             next.child
///                 .decode_value(child, &DecodeOptions::default())
///                 .map_err(<serde_json::Error as serde::de::Error>::custom)?;
///         }
///         *self = next;
///         Ok(())
///     }
/// }
///
/// let leaf = Shared::new(Leaf { key: "a".into() });
/// let mut branch = Branch { child: Poly::from(Child::Leaf(leaf.clone())), hits: 3 };
/// let mut fields = Map::new();
/// fields.insert("child".into(), serde_json::json!({"key": "b"}));
/// branch.patch(fields).unwrap();
/// assert_eq!(leaf.get(), Some(Leaf { key: "b".into() }));
/// assert_eq!(branch.hits, 3);
/// ```
pub trait Variant: Serialize + DeserializeOwned + 'static {
    const TYPE_NAME: &'static str;

    /// Builds a new value from `self` with `patch` merged over its JSON form.
    ///
    /// `self` is not touched. Objects merge key by key; an object whose
    /// `type` differs from the one it lands on replaces it whole.
    fn merged(&self, patch: Map<String, Value>) -> Result<Self, serde_json::Error> {
        let mut merged = parse::encode(self)?;
        merge_patch(&mut merged, Value::Object(patch));
        parse::decode(merged)
    }

    /// Applies a same-type patch. Overrides must be all-or-nothing: on error
    /// `self` is left exactly as it was.
    fn patch(&mut self, patch: Map<String, Value>) -> Result<(), serde_json::Error> {
        *self = self.merged(patch)?;
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Ownership {
    /// The container owns the variant value itself.
    Value,
    /// The container owns a handle; the referent may be shared.
    Handle,
}

/// How a variant is stored inside a sum type arm.
///
/// Implemented for every `T: Variant` (held by value) and for `Shared<T>`
/// (held through a nullable shared handle).
pub trait Slot: Sized + 'static {
    type Target: Variant;
    const OWNERSHIP: Ownership;

    fn from_target(target: Self::Target) -> Self;

    fn type_name(&self) -> &'static str {
        Self::Target::TYPE_NAME
    }

    fn is_null(&self) -> bool {
        false
    }

    /// Encodes the held fields, or `None` for a null handle.
    fn encode(&self) -> Result<Option<Value>, serde_json::Error>;

    /// Merges `patch` onto the held value through [`Variant::patch`]. On error
    /// the slot is unchanged.
    ///
    /// A null handle has nothing to merge onto, so it takes a fresh value
    /// decoded from `patch` alone. `Poly` never patches a null handle.
    fn patch(&mut self, patch: Map<String, Value>) -> Result<(), serde_json::Error>;
}

impl<T: Variant> Slot for T {
    type Target = T;
    const OWNERSHIP: Ownership = Ownership::Value;

    fn from_target(target: T) -> Self {
        target
    }

    fn encode(&self) -> Result<Option<Value>, serde_json::Error> {
        parse::encode(self).map(Some)
    }

    fn patch(&mut self, patch: Map<String, Value>) -> Result<(), serde_json::Error> {
        Variant::patch(self, patch)
    }
}

/// Nullable shared handle to a variant.
///
/// Clones share the referent. A patch decoded through one clone is visible to
/// all of them; there is no isolation beyond the per-patch lock.
pub struct Shared<T>(Option<Arc<Mutex<T>>>);

fn lock<T>(cell: &Mutex<T>) -> MutexGuard<'_, T> {
    cell.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T> Shared<T> {
    pub fn new(value: T) -> Self {
        Self(Some(Arc::new(Mutex::new(value))))
    }

    pub fn null() -> Self {
        Self(None)
    }

    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.0.as_ref().map(|cell| f(&*lock(cell)))
    }

    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.0.as_ref().map(|cell| f(&mut *lock(cell)))
    }

    pub fn get(&self) -> Option<T>
    where
        T: Clone,
    {
        self.with(T::clone)
    }

    /// True when both handles point at the same referent (or both are null).
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Default for Shared<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T> From<T> for Shared<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(cell) => f.debug_tuple("Shared").field(&*lock(cell)).finish(),
            None => f.write_str("Shared(null)"),
        }
    }
}

impl<T: PartialEq> PartialEq for Shared<T> {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        match (&self.0, &other.0) {
            (Some(a), Some(b)) => *lock(a) == *lock(b),
            _ => false,
        }
    }
}

impl<T: Variant> Slot for Shared<T> {
    type Target = T;
    const OWNERSHIP: Ownership = Ownership::Handle;

    fn from_target(target: T) -> Self {
        Self::new(target)
    }

    fn is_null(&self) -> bool {
        Shared::is_null(self)
    }

    fn encode(&self) -> Result<Option<Value>, serde_json::Error> {
        match &self.0 {
            Some(cell) => parse::encode(&*lock(cell)).map(Some),
            None => Ok(None),
        }
    }

    fn patch(&mut self, patch: Map<String, Value>) -> Result<(), serde_json::Error> {
        if let Some(cell) = &self.0 {
            return Variant::patch(&mut *lock(cell), patch);
        }
        // Only reachable through the trait itself: `Poly` treats a null
        // handle as an empty container and decodes a fresh value instead.
        *self = Self::new(parse::decode(Value::Object(patch))?);
        Ok(())
    }
}
