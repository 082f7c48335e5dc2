//! Purpose: Apply a field-level patch onto an encoded value.
//! Exports: `merge_patch`.
//! Role: Gives decode-into-existing semantics on top of serde, which only builds fresh values.
//! Invariants: Objects merge key by key, recursively; any other patch value replaces.
//! Invariants: Keys absent from the patch keep their previous value and position.
//! Invariants: Objects whose `type` strings differ never merge; the patch replaces.

use crate::core::poly::TYPE_FIELD;
use serde_json::{Map, Value};

fn discriminator(object: &Map<String, Value>) -> Option<&str> {
    object.get(TYPE_FIELD).and_then(Value::as_str)
}

fn changes_type(base: &Map<String, Value>, patch: &Map<String, Value>) -> bool {
    matches!(
        (discriminator(base), discriminator(patch)),
        (Some(held), Some(incoming)) if held != incoming
    )
}

pub(crate) fn merge_patch(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            if changes_type(base, &patch) {
                *base = patch;
                return;
            }
            for (key, value) in patch {
                match base.get_mut(&key) {
                    Some(slot) => merge_patch(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, patch) => *base = patch,
    }
}
