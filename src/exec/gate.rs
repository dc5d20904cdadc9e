//! The execution gate.
//!
//! The vendor tools mutate shared on-disk registry state with no
//! locking of their own, so every invocation funnels through one gate:
//! an in-process mutex, optionally backed by an exclusive advisory file
//! lock so concurrent dseectl processes serialize too. Tests construct
//! the gate without a lock file.

use crate::constants::LOCK_FILE_NAME;
use crate::error::{DseectlError, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

pub struct ExecutionGate {
    serial: Mutex<()>,
    lock_path: Option<PathBuf>,
}

/// Held for the duration of one vendor tool run. Dropping the guard
/// releases both the mutex and the file lock.
pub struct GateGuard<'a> {
    _serial: MutexGuard<'a, ()>,
    _file: Option<File>,
}

impl ExecutionGate {
    /// In-process serialization only.
    pub fn in_process() -> Self {
        Self {
            serial: Mutex::new(()),
            lock_path: None,
        }
    }

    /// In-process serialization plus a cross-process advisory file lock.
    pub fn with_lock_file(path: impl Into<PathBuf>) -> Self {
        Self {
            serial: Mutex::new(()),
            lock_path: Some(path.into()),
        }
    }

    pub fn default_lock_path() -> PathBuf {
        std::env::temp_dir().join(LOCK_FILE_NAME)
    }

    /// Blocks until the gate is free.
    pub fn acquire(&self) -> Result<GateGuard<'_>> {
        let serial = self
            .serial
            .lock()
            .map_err(|_| DseectlError::Lock("execution gate poisoned".into()))?;

        let file = match &self.lock_path {
            None => None,
            Some(path) => {
                let file = OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(false)
                    .open(path)
                    .map_err(|e| DseectlError::Io {
                        path: path.clone(),
                        source: e,
                    })?;
                file.lock_exclusive()
                    .map_err(|e| DseectlError::Lock(format!("{}: {}", path.display(), e)))?;
                let _ = writeln!(&file, "{}", std::process::id());
                Some(file)
            }
        };

        Ok(GateGuard {
            _serial: serial,
            _file: file,
        })
    }
}
