//! Purpose: Internal JSON codec boundary used by the polymorphic container.
//! Exports: `parse` (bytes/tree/typed conversions) and `merge` (field-level patching).
//! Role: Single seam over serde_json so the container never calls it ad hoc.
//! Invariants: Object field order is preserved (serde_json `preserve_order`).
//! Invariants: Helpers are pure; no hidden global state.

pub(crate) mod merge;
pub(crate) mod parse;
