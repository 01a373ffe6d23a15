//! Rollout-trigger hash
//!
//! The Deployment carries a digest of every resource version it depends on.
//! A digest keeps the annotation bounded no matter how many resources are
//! tracked; a changed annotation on the pod template is what makes the
//! Deployment controller roll out new pods.

use aws_lc_rs::digest::{digest, SHA512};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::canonical::canonicalize_markers;

/// Length of a rendered hash: 64 digest bytes in unpadded base64
pub const HASH_LEN: usize = 86;

/// Hash a set of resource version markers into a printable token.
///
/// SHA-512 over the canonical marker string, encoded as URL-safe base64
/// without padding. The encoding must stay stable so that hashes written by
/// earlier operator versions compare equal for unchanged inputs.
pub fn hash_markers<S: AsRef<str>>(markers: &[S]) -> String {
    hash_canonical(&canonicalize_markers(markers))
}

/// Hash an already-canonical marker string.
pub fn hash_canonical(canonical: &str) -> String {
    let hash = digest(&SHA512, canonical.as_bytes());
    URL_SAFE_NO_PAD.encode(hash.as_ref())
}
