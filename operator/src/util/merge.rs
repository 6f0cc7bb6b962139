use serde_json::Value;

/// Overlay `patch` onto `base`, replacing only the top-level keys present
/// in `patch`. This is intentionally shallow: it is not RFC 6902 JSON
/// Patch nor RFC 7396 JSON Merge Patch, and it does not recurse into
/// nested objects. A patch key set to `null` removes the key from `base`.
pub fn shallow_merge(base: &mut Value, patch: Value) {
    let (Value::Object(base), Value::Object(patch)) = (base, patch) else {
        return;
    };
    for (k, v) in patch {
        if v.is_null() {
            base.remove(&k);
        } else {
            base.insert(k, v);
        }
    }
}
