//! List DSCC registry entries.

use crate::cli::args::RegistryArgs;
use crate::config::loader;
use crate::error::Result;
use crate::registry::{self, RegistryKind};
use crate::ui;

pub fn run(args: &RegistryArgs) -> Result<()> {
    let kind: RegistryKind = args.kind.parse()?;
    let manifest = loader::load(&args.config)?;
    let exec = super::invoker(&manifest);
    let admin = manifest.credentials.admin();

    let entries = registry::entries(&exec, &admin, kind)?;

    if args.json {
        let rows: Vec<_> = entries.iter().map(|e| &e.fields).collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if entries.is_empty() {
        ui::info(&format!("no {} registered", kind));
        return Ok(());
    }

    for entry in &entries {
        ui::header(&entry.ipath);
        for (key, value) in &entry.fields {
            if key != "ipath" {
                ui::keyval(key, value);
            }
        }
    }
    Ok(())
}
