//! Hash command

use clap::Args;
use tracing::debug;

use authop_deployment::canonical::canonicalize_markers;
use authop_deployment::hash::hash_canonical;

#[derive(Args, Debug)]
pub struct HashArgs {
    /// Resource version markers, in any order
    pub resource_versions: Vec<String>,
}

pub fn run(args: HashArgs) -> String {
    let canonical = canonicalize_markers(&args.resource_versions);
    debug!(resource_versions = %canonical, "hashing resource versions");
    hash_canonical(&canonical)
}
