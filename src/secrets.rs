//! Transient credential files.
//!
//! The vendor tools read passwords from files (`-w pwd-file`), but a
//! password must never outlive the command that needs it. A [`Secret`]
//! owns one credential and materializes it on demand: the file is
//! created with an unpredictable name, restricted to owner-read before
//! any content lands, written atomically (sibling temp name, then
//! rename), and removed when the borrowing scope ends — on success,
//! error or panic alike.

use crate::error::{DseectlError, Result};
use crate::ui;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// One logical credential (admin password, agent password, cert
/// password) and its plaintext value.
pub struct Secret {
    label: String,
    value: String,
    // Stable per-instance file path, allocated lazily. Guarded so two
    // callers sharing one logical secret serialize their
    // create/use/delete cycles; distinct secrets do not contend.
    path: Mutex<Option<PathBuf>>,
}

impl Secret {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            path: Mutex::new(None),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// True when `path` exists and its content is exactly this secret.
    /// Used to skip rewriting an already-correct file.
    pub fn matches_file(&self, path: &Path) -> bool {
        fs::read_to_string(path)
            .map(|content| content == self.value)
            .unwrap_or(false)
    }

    /// Materialize the secret file, run `f` with its path, then remove
    /// the file. Removal is guaranteed on every exit path, including
    /// panics inside `f`. A leftover file from a crashed prior run is
    /// treated as stale and overwritten.
    pub fn with_file<T>(&self, f: impl FnOnce(&Path) -> Result<T>) -> Result<T> {
        let mut slot = self
            .path
            .lock()
            .map_err(|_| DseectlError::Lock(format!("secret '{}' lock poisoned", self.label)))?;

        let path = match slot.as_ref() {
            Some(p) => p.clone(),
            None => {
                let p = allocate_path()?;
                *slot = Some(p.clone());
                p
            }
        };

        if !self.matches_file(&path) {
            write_restricted(&path, &self.value)?;
        }

        let _cleanup = RemoveOnDrop { path: &path };
        f(&path)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secret")
            .field("label", &self.label)
            .field("value", &"<redacted>")
            .finish()
    }
}

struct RemoveOnDrop<'a> {
    path: &'a Path,
}

impl Drop for RemoveOnDrop<'_> {
    fn drop(&mut self) {
        if self.path.exists() {
            let _ = fs::remove_file(self.path);
        }
    }
}

/// Reserve an unpredictable file name in the temp directory. The file
/// itself only lives for the duration of a `with_file` scope.
fn allocate_path() -> Result<PathBuf> {
    let file = tempfile::Builder::new()
        .prefix(".dspw-")
        .tempfile()
        .map_err(|e| DseectlError::SecretMaterialization(e.to_string()))?;
    let (_, path) = file
        .keep()
        .map_err(|e| DseectlError::SecretMaterialization(e.to_string()))?;
    Ok(path)
}

/// Write `value` to `path` without any window where a partially written
/// or world-readable secret is observable: chmod the sibling before
/// content lands, then rename into place.
fn write_restricted(path: &Path, value: &str) -> Result<()> {
    let dir = path.parent().ok_or_else(|| {
        DseectlError::SecretMaterialization(format!("no parent directory for {}", path.display()))
    })?;

    let mut sibling = tempfile::Builder::new()
        .prefix(".dspw-")
        .tempfile_in(dir)
        .map_err(|e| DseectlError::SecretMaterialization(e.to_string()))?;

    restrict_mode(sibling.as_file());
    sibling
        .as_file_mut()
        .write_all(value.as_bytes())
        .and_then(|()| sibling.as_file_mut().flush())
        .map_err(|e| DseectlError::SecretMaterialization(e.to_string()))?;

    sibling
        .persist(path)
        .map_err(|e| DseectlError::SecretMaterialization(e.to_string()))?;
    Ok(())
}

// The content protection is the short lifetime; a failed chmod is logged,
// not fatal.
#[cfg(unix)]
fn restrict_mode(file: &fs::File) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = file.set_permissions(fs::Permissions::from_mode(0o400)) {
        ui::warning(&format!("could not restrict secret file mode: {}", e));
    }
}

#[cfg(not(unix))]
fn restrict_mode(_file: &fs::File) {
    ui::warning("secret file modes are not supported on this platform");
}
