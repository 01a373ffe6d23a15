//! CLI commands

use std::path::Path;

use crate::{Error, Result};

pub mod hash;
pub mod render;

/// Read a file to a string, keeping the path in the error.
pub(crate) fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })
}
