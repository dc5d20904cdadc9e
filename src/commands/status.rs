//! Probe everything in the manifest and report, changing nothing.

use crate::cli::args::StatusArgs;
use crate::config::loader;
use crate::error::Result;
use crate::parse::StateMap;
use crate::probe;
use crate::reconcile::setup;
use crate::ui;
use std::collections::BTreeMap;

pub fn run(args: &StatusArgs) -> Result<()> {
    let manifest = loader::load(&args.config)?;
    let exec = super::invoker(&manifest);

    let mut report: BTreeMap<String, StateMap> = BTreeMap::new();

    if manifest.registry.is_some() {
        let mut state = StateMap::new();
        state.insert(
            "created".into(),
            setup::ads_created(&exec).to_string(),
        );
        report.insert("dscc_registry".into(), state);
    }

    for cfg in &manifest.instances {
        let state = probe::instance_info(&exec, &cfg.path).unwrap_or_default();
        report.insert(format!("instance:{}", cfg.path.display()), state);
    }

    for cfg in &manifest.agents {
        let state = probe::agent_info(&exec, &cfg.path).unwrap_or_default();
        report.insert(format!("agent:{}", cfg.path.display()), state);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for (entity, state) in &report {
        ui::header(entity);
        if state.is_empty() {
            ui::indent("(unavailable)", 1);
            continue;
        }
        for (key, value) in state {
            ui::keyval(key, value);
        }
    }
    Ok(())
}
