//! Tear manifest entities down, in the reverse of sync order: suffix
//! data first, then registrations, agents, instances and finally the
//! registry bootstrap.

use crate::cli::args::ManifestArgs;
use crate::config::loader;
use crate::error::Result;
use crate::reconcile::agent::AgentReconciler;
use crate::reconcile::instance::InstanceReconciler;
use crate::reconcile::registration::RegistrationReconciler;
use crate::reconcile::setup::SetupReconciler;
use crate::reconcile::suffix::SuffixReconciler;
use crate::ui;

pub fn run(args: &ManifestArgs) -> Result<()> {
    let manifest = loader::load(&args.config)?;
    let exec = super::invoker(&manifest);

    let admin = manifest.credentials.admin();
    let agent_secret = manifest.credentials.agent();

    let mut changed = 0usize;

    for cfg in manifest.suffixes.iter().rev() {
        if SuffixReconciler::new(&exec, cfg, &admin).delete()?.changed() {
            changed += 1;
        }
    }

    for cfg in manifest.registrations.iter().rev() {
        let rec = RegistrationReconciler::new(&exec, cfg, &admin, &agent_secret);
        if rec.remove()?.changed() {
            changed += 1;
        }
    }

    for cfg in manifest.agents.iter().rev() {
        let rec = AgentReconciler::new(&exec, cfg, &agent_secret);
        if rec.stop()?.changed() {
            changed += 1;
        }
        if cfg.snmp.is_some() && rec.disable_snmp()?.changed() {
            changed += 1;
        }
        if cfg.register_service && rec.disable_service()?.changed() {
            changed += 1;
        }
        if rec.delete()?.changed() {
            changed += 1;
        }
    }

    for cfg in manifest.instances.iter().rev() {
        let rec = InstanceReconciler::new(&exec, cfg, &admin);
        if rec.stop()?.changed() {
            changed += 1;
        }
        if rec.delete()?.changed() {
            changed += 1;
        }
    }

    if let Some(setup) = &manifest.registry
        && SetupReconciler::new(&exec, setup, &admin).delete()?.changed()
    {
        changed += 1;
    }

    ui::separator();
    ui::success(&format!("teardown complete: {} operations changed state", changed));
    Ok(())
}
