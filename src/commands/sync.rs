//! Bring everything in the manifest to its desired state, in dependency
//! order: registry bootstrap, then instances, agents, registrations and
//! finally suffix data.

use crate::cli::args::ManifestArgs;
use crate::config::loader;
use crate::error::{DseectlError, Result};
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
    let cert = manifest.credentials.cert();

    let mut changed = 0usize;
    let mut total = 0usize;
    let mut tally = |outcome: crate::reconcile::Outcome| {
        total += 1;
        if outcome.changed() {
            changed += 1;
        }
    };

    if let Some(setup) = &manifest.registry {
        ui::header("DSCC registry");
        tally(SetupReconciler::new(&exec, setup, &admin).create()?);
    }

    if !manifest.instances.is_empty() {
        ui::header("Instances");
    }
    for cfg in &manifest.instances {
        interruptible()?;
        let rec = InstanceReconciler::new(&exec, cfg, &admin).with_cert(cert.as_ref());
        tally(rec.create()?);
        if cfg.start {
            tally(rec.start()?);
        }
    }

    if !manifest.agents.is_empty() {
        ui::header("Agents");
    }
    for cfg in &manifest.agents {
        interruptible()?;
        let rec = AgentReconciler::new(&exec, cfg, &agent_secret);
        tally(rec.create()?);
        if cfg.snmp.is_some() {
            tally(rec.enable_snmp()?);
        }
        if cfg.register_service {
            tally(rec.enable_service()?);
        }
        if cfg.start {
            tally(rec.start()?);
        }
    }

    if !manifest.registrations.is_empty() {
        ui::header("Registrations");
    }
    for cfg in &manifest.registrations {
        interruptible()?;
        tally(RegistrationReconciler::new(&exec, cfg, &admin, &agent_secret).add()?);
    }

    if !manifest.suffixes.is_empty() {
        ui::header("Suffixes");
    }
    for cfg in &manifest.suffixes {
        interruptible()?;
        let rec = SuffixReconciler::new(&exec, cfg, &admin);
        tally(rec.create()?);
        if cfg.ldif_file.is_some() {
            tally(rec.import()?);
        }
    }

    ui::separator();
    ui::success(&format!(
        "converged: {} of {} operations changed state",
        changed, total
    ));
    Ok(())
}

fn interruptible() -> Result<()> {
    if ui::is_interrupted() {
        return Err(DseectlError::Other("operation cancelled by user".into()));
    }
    Ok(())
}
