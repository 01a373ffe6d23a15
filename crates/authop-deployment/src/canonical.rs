//! Canonical forms for unordered inputs
//!
//! Anything that feeds the rollout hash or ends up in the rendered manifest
//! must not depend on caller ordering or map iteration order, otherwise a
//! diff against the live object reports a change that isn't there.

use std::collections::HashMap;

/// Separator between markers in the canonical string
pub const MARKER_SEPARATOR: &str = ",";

/// Canonical string for a multiset of resource version markers.
///
/// Markers are sorted byte-wise ascending and joined with `,`. Duplicates are
/// kept. Empty input yields an empty string.
pub fn canonicalize_markers<S: AsRef<str>>(markers: &[S]) -> String {
    let mut sorted: Vec<&str> = markers.iter().map(AsRef::as_ref).collect();
    sorted.sort_unstable();
    sorted.join(MARKER_SEPARATOR)
}

/// Keys of a renamed-key mapping in ascending order.
pub fn ordered_keys<V>(renamed_keys: &HashMap<String, V>) -> Vec<&str> {
    let mut keys: Vec<&str> = renamed_keys.keys().map(String::as_str).collect();
    keys.sort_unstable();
    keys
}
