pub mod completions;
pub mod destroy;
pub mod registry;
pub mod status;
pub mod sync;

use crate::config::types::Manifest;
use crate::exec::{ExecutionGate, ProcessInvoker, Toolbox};

/// The production invoker: resolves binaries under the manifest's
/// install root and serializes across dseectl processes through the
/// shared lock file.
pub(crate) fn invoker(manifest: &Manifest) -> ProcessInvoker {
    ProcessInvoker::new(Toolbox::new(manifest.install_dir.clone()))
        .with_gate(ExecutionGate::with_lock_file(ExecutionGate::default_lock_path()))
}
