//! Purpose: Define the stable public Rust API boundary for polyjson.
//! Exports: Container, variant, registry, option, and error types.
//! Role: Public, additive-only surface; hides the codec seam and core layout.
//! Invariants: This module is the only public path to core types.
//! Invariants: `poly_enum!` expands only to items re-exported here.

pub use crate::core::error::{Error, ErrorKind, Operation};
pub use crate::core::poly::{
    DecodeOptions, DiscriminatorPolicy, Member, Poly, PolyValue, TYPE_FIELD,
};
#[doc(hidden)]
pub use crate::core::registry::assert_unique_names;
pub use crate::core::registry::{VariantDescriptor, VariantSet, VariantSetBuilder};
pub use crate::core::variant::{Ownership, Shared, Slot, Variant};
