//! DSCC registry membership, managed through `dsccreg`.

use super::Outcome;
use crate::config::types::RegistrationConfig;
use crate::error::Result;
use crate::exec::{ArgSet, CommandInvocation, EXIT_OK, Executor, Tool};
use crate::registry::{self, RegistryKind};
use crate::secrets::Secret;
use crate::ui;
use std::path::Path;

pub struct RegistrationReconciler<'a> {
    exec: &'a dyn Executor,
    cfg: &'a RegistrationConfig,
    admin: &'a Secret,
    agent_secret: &'a Secret,
}

impl<'a> RegistrationReconciler<'a> {
    pub fn new(
        exec: &'a dyn Executor,
        cfg: &'a RegistrationConfig,
        admin: &'a Secret,
        agent_secret: &'a Secret,
    ) -> Self {
        Self {
            exec,
            cfg,
            admin,
            agent_secret,
        }
    }

    fn path(&self) -> &Path {
        &self.cfg.path
    }

    fn registered(&self) -> bool {
        registry::member_of(self.exec, self.admin, self.cfg.kind, self.path())
    }

    pub fn add(&self) -> Result<Outcome> {
        if self.registered() {
            ui::info(&format!(
                "{} is registered - nothing to do",
                self.path().display()
            ));
            return Ok(Outcome::Unchanged);
        }

        match self.cfg.kind {
            RegistryKind::Agents => self.add_agent()?,
            RegistryKind::Servers => self.add_server()?,
        }

        ui::success(&format!(
            "{} added to the DSCC registry",
            self.path().display()
        ));
        Ok(Outcome::Changed)
    }

    pub fn remove(&self) -> Result<Outcome> {
        if !self.registered() {
            ui::info(&format!(
                "{} is not registered - nothing to do",
                self.path().display()
            ));
            return Ok(Outcome::Unchanged);
        }

        match self.cfg.kind {
            RegistryKind::Agents => self.remove_agent()?,
            RegistryKind::Servers => self.remove_server()?,
        }

        ui::success(&format!(
            "{} removed from the DSCC registry",
            self.path().display()
        ));
        Ok(Outcome::Changed)
    }

    fn add_agent(&self) -> Result<()> {
        self.admin.with_file(|admin_pw| {
            self.agent_secret.with_file(|agent_pw| {
                let args = ArgSet::new()
                    .opt("-d", self.cfg.description.as_deref())
                    .opt("-H", self.cfg.hostname.as_deref())
                    .opt("-G", Some(agent_pw.display()))
                    .opt("-w", Some(admin_pw.display()))
                    .operand(self.path().display().to_string());
                let inv = CommandInvocation::new(Tool::Dsccreg, "add_agent", args);
                self.exec.execute(&inv, EXIT_OK).map(|_| ())
            })
        })
    }

    fn remove_agent(&self) -> Result<()> {
        let args = ArgSet::new()
            .opt("-H", self.cfg.hostname.as_deref())
            .switch("-f", self.cfg.force)
            .operand(self.path().display().to_string());
        let inv = CommandInvocation::new(Tool::Dsccreg, "remove_agent", args);
        self.exec.execute(&inv, EXIT_OK).map(|_| ())
    }

    fn add_server(&self) -> Result<()> {
        self.admin.with_file(|admin_pw| {
            let args = ArgSet::new()
                .opt("-B", self.cfg.dn.as_deref())
                .opt("-G", Some(admin_pw.display()))
                .opt("-d", self.cfg.description.as_deref())
                .opt("-H", self.cfg.agent_port)
                .operand(self.path().display().to_string());
            let inv = CommandInvocation::new(Tool::Dsccreg, "add_server", args);
            self.exec.execute(&inv, EXIT_OK).map(|_| ())
        })
    }

    fn remove_server(&self) -> Result<()> {
        self.admin.with_file(|admin_pw| {
            let args = ArgSet::new()
                .opt("-B", self.cfg.dn.as_deref())
                .opt("-G", Some(admin_pw.display()))
                .opt("-H", self.cfg.hostname.as_deref())
                .operand(self.path().display().to_string());
            let inv = CommandInvocation::new(Tool::Dsccreg, "remove_server", args);
            self.exec.execute(&inv, EXIT_OK).map(|_| ())
        })
    }
}
