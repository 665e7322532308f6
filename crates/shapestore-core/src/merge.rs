//! Reconciling declared defaults with raw input.

use crate::attribute::{Field, Fields};
use serde_json::{Map, Value};
use tracing::trace;

/// Merge raw input into a copy of the declared fields.
///
/// Attributes present in `raw` take the raw value; relations keep their
/// declaration. Input keys the shape does not declare are ignored. The
/// declared map is never modified, so every caller gets its own copy.
pub fn merge_fields(declared: &Fields, raw: Option<&Map<String, Value>>) -> Fields {
    let mut merged = declared.clone();

    let Some(raw) = raw else {
        return merged;
    };

    for (key, value) in raw {
        match merged.get_mut(key) {
            Some(Field::Attr(attr)) => attr.value = value.clone(),
            Some(Field::BelongsTo(_)) => {}
            None => trace!(field = %key, "ignoring undeclared input field"),
        }
    }

    merged
}
