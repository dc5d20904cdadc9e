use crate::config::types::Manifest;
use crate::config::validate;
use crate::error::{DseectlError, Result};
use std::fs;
use std::path::Path;

/// Read, deserialize and validate a manifest file.
pub fn load(path: &Path) -> Result<Manifest> {
    let raw = fs::read_to_string(path).map_err(|e| DseectlError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let manifest: Manifest = serde_yml::from_str(&raw)?;
    validate::validate(&manifest)?;
    Ok(manifest)
}
