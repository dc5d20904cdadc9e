//! DSCC registry bootstrap, managed through `dsccsetup`.

use super::Outcome;
use crate::config::types::SetupConfig;
use crate::constants::ADS_CREATED_MARKER;
use crate::error::Result;
use crate::exec::{ArgSet, CommandInvocation, EXIT_OK, Executor, Tool};
use crate::secrets::Secret;
use crate::ui;

/// `dsccsetup status` prints a prose report; the registry exists once
/// the marker line shows up. Any failure reads as "not created".
pub fn ads_created(exec: &dyn Executor) -> bool {
    let inv = CommandInvocation::new(Tool::Dsccsetup, "status", ArgSet::new());
    exec.execute(&inv, EXIT_OK)
        .map(|out| out.stdout.contains(ADS_CREATED_MARKER))
        .unwrap_or(false)
}

pub struct SetupReconciler<'a> {
    exec: &'a dyn Executor,
    cfg: &'a SetupConfig,
    admin: &'a Secret,
}

impl<'a> SetupReconciler<'a> {
    pub fn new(exec: &'a dyn Executor, cfg: &'a SetupConfig, admin: &'a Secret) -> Self {
        Self { exec, cfg, admin }
    }

    pub fn create(&self) -> Result<Outcome> {
        if ads_created(self.exec) {
            ui::info("DSCC registry already initialized - nothing to do");
            return Ok(Outcome::Unchanged);
        }

        self.admin.with_file(|pwfile| {
            let args = ArgSet::new()
                .opt("-w", Some(pwfile.display()))
                .opt("-p", self.cfg.ldap_port)
                .opt("-P", self.cfg.ldaps_port);
            let inv = CommandInvocation::new(Tool::Dsccsetup, "ads_create", args);
            self.exec.execute(&inv, EXIT_OK).map(|_| ())
        })?;

        ui::success("DSCC registry initialized");
        Ok(Outcome::Changed)
    }

    pub fn delete(&self) -> Result<Outcome> {
        if !ads_created(self.exec) {
            ui::info("DSCC registry does not exist - nothing to do");
            return Ok(Outcome::Unchanged);
        }

        let args = ArgSet::new().switch("-i", self.cfg.no_inter);
        let inv = CommandInvocation::new(Tool::Dsccsetup, "ads_delete", args);
        self.exec.execute(&inv, EXIT_OK)?;
        ui::success("DSCC registry deleted");
        Ok(Outcome::Changed)
    }
}
