//! Directory Server instances, managed through `dsadm`.

use super::Outcome;
use crate::config::types::InstanceConfig;
use crate::error::Result;
use crate::exec::{ArgSet, CommandInvocation, EXIT_OK, Executor, Tool};
use crate::probe;
use crate::secrets::Secret;
use crate::ui;
use std::path::Path;

pub struct InstanceReconciler<'a> {
    exec: &'a dyn Executor,
    cfg: &'a InstanceConfig,
    admin: &'a Secret,
    cert: Option<&'a Secret>,
}

impl<'a> InstanceReconciler<'a> {
    pub fn new(exec: &'a dyn Executor, cfg: &'a InstanceConfig, admin: &'a Secret) -> Self {
        Self {
            exec,
            cfg,
            admin,
            cert: None,
        }
    }

    /// Certificate database password, used by `start` when the instance
    /// carries a cert store.
    pub fn with_cert(mut self, cert: Option<&'a Secret>) -> Self {
        self.cert = cert;
        self
    }

    fn path(&self) -> &Path {
        &self.cfg.path
    }

    pub fn create(&self) -> Result<Outcome> {
        if probe::instance_exists(self.exec, self.path()) {
            ui::info(&format!(
                "instance {} already created - nothing to do",
                self.path().display()
            ));
            return Ok(Outcome::Unchanged);
        }

        self.admin.with_file(|pwfile| {
            let args = ArgSet::new()
                .opt("-B", self.cfg.below.as_ref().map(|p| p.display()))
                .switch("-i", self.cfg.no_inter)
                .opt("-u", self.cfg.user_name.as_deref())
                .opt("-g", self.cfg.group_name.as_deref())
                .opt("-h", self.cfg.hostname.as_deref())
                .opt("-p", self.cfg.ldap_port)
                .opt("-P", self.cfg.ldaps_port)
                .opt("-D", self.cfg.dn.as_deref())
                .opt("-w", Some(pwfile.display()))
                .operand(self.path().display().to_string());
            let inv = CommandInvocation::new(Tool::Dsadm, "create", args);
            self.exec.execute(&inv, EXIT_OK).map(|_| ())
        })?;

        ui::success(&format!("instance {} created", self.path().display()));
        Ok(Outcome::Changed)
    }

    pub fn delete(&self) -> Result<Outcome> {
        if !probe::instance_exists(self.exec, self.path()) {
            ui::info(&format!(
                "instance {} does not exist - nothing to do",
                self.path().display()
            ));
            return Ok(Outcome::Unchanged);
        }

        let inv = CommandInvocation::new(
            Tool::Dsadm,
            "delete",
            ArgSet::new().operand(self.path().display().to_string()),
        );
        self.exec.execute(&inv, EXIT_OK)?;
        ui::success(&format!("instance {} deleted", self.path().display()));
        Ok(Outcome::Changed)
    }

    /// Start only from present-but-stopped; an instance we cannot see
    /// is not started, a running one is left alone.
    pub fn start(&self) -> Result<Outcome> {
        if !probe::instance_exists(self.exec, self.path()) {
            ui::info(&format!(
                "instance {} does not exist - nothing to do",
                self.path().display()
            ));
            return Ok(Outcome::Unchanged);
        }
        if probe::instance_running(self.exec, self.path()) {
            ui::info(&format!(
                "instance {} is running - nothing to do",
                self.path().display()
            ));
            return Ok(Outcome::Unchanged);
        }

        self.start_command()?;
        ui::success(&format!("instance {} started", self.path().display()));
        Ok(Outcome::Changed)
    }

    pub fn stop(&self) -> Result<Outcome> {
        if !probe::instance_running(self.exec, self.path()) {
            ui::info(&format!(
                "instance {} not running - nothing to do",
                self.path().display()
            ));
            return Ok(Outcome::Unchanged);
        }

        self.stop_command()?;
        ui::success(&format!("instance {} stopped", self.path().display()));
        Ok(Outcome::Changed)
    }

    pub fn restart(&self) -> Result<Outcome> {
        if !probe::instance_exists(self.exec, self.path()) {
            ui::info(&format!(
                "instance {} does not exist - nothing to do",
                self.path().display()
            ));
            return Ok(Outcome::Unchanged);
        }

        if probe::instance_running(self.exec, self.path()) {
            self.stop_command()?;
        }
        self.start_command()?;
        ui::success(&format!("instance {} restarted", self.path().display()));
        Ok(Outcome::Changed)
    }

    fn start_command(&self) -> Result<()> {
        match self.cert {
            Some(cert) => cert.with_file(|certfile| self.run_start(Some(certfile))),
            None => self.run_start(None),
        }
    }

    fn run_start(&self, certfile: Option<&Path>) -> Result<()> {
        let args = ArgSet::new()
            .switch("-E", self.cfg.safe_mode)
            .switch("-i", self.cfg.no_inter)
            .switch("--schema-push", self.cfg.schema_push)
            .opt("-W", certfile.map(|p| p.display()))
            .operand(self.path().display().to_string());
        let inv = CommandInvocation::new(Tool::Dsadm, "start", args);
        self.exec.execute(&inv, EXIT_OK).map(|_| ())
    }

    fn stop_command(&self) -> Result<()> {
        let args = ArgSet::new()
            .switch("--force", self.cfg.force)
            .operand(self.path().display().to_string());
        let inv = CommandInvocation::new(Tool::Dsadm, "stop", args);
        self.exec.execute(&inv, EXIT_OK).map(|_| ())
    }
}
