//! Recursive merge of JSON values.

use serde_json::Value;

/// Merge `overlay` into `base`.
///
/// Objects merge key by key, recursively; keys new to `base` are appended.
/// Arrays and scalars in `overlay` replace whatever `base` holds.
pub fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
