//! DSCC agent instances, managed through `dsccagent`.

use super::Outcome;
use crate::config::types::AgentConfig;
use crate::error::Result;
use crate::exec::{ArgSet, CommandInvocation, EXIT_OK, Executor, Tool};
use crate::probe::{self, SnmpState};
use crate::secrets::Secret;
use crate::ui;
use std::path::Path;

pub struct AgentReconciler<'a> {
    exec: &'a dyn Executor,
    cfg: &'a AgentConfig,
    agent_secret: &'a Secret,
}

impl<'a> AgentReconciler<'a> {
    pub fn new(exec: &'a dyn Executor, cfg: &'a AgentConfig, agent_secret: &'a Secret) -> Self {
        Self {
            exec,
            cfg,
            agent_secret,
        }
    }

    fn path(&self) -> &Path {
        &self.cfg.path
    }

    pub fn create(&self) -> Result<Outcome> {
        if probe::agent_exists(self.exec, self.path()) {
            ui::info(&format!(
                "agent {} already created - nothing to do",
                self.path().display()
            ));
            return Ok(Outcome::Unchanged);
        }

        self.agent_secret.with_file(|pwfile| {
            let args = ArgSet::new()
                .switch("-i", self.cfg.no_inter)
                .opt("-p", self.cfg.port)
                .opt("-w", Some(pwfile.display()))
                .operand(self.path().display().to_string());
            let inv = CommandInvocation::new(Tool::Dsccagent, "create", args);
            self.exec.execute(&inv, EXIT_OK).map(|_| ())
        })?;

        ui::success(&format!("agent {} created", self.path().display()));
        Ok(Outcome::Changed)
    }

    pub fn delete(&self) -> Result<Outcome> {
        if !probe::agent_exists(self.exec, self.path()) {
            ui::info(&format!(
                "agent {} does not exist - nothing to do",
                self.path().display()
            ));
            return Ok(Outcome::Unchanged);
        }

        let inv = CommandInvocation::new(
            Tool::Dsccagent,
            "delete",
            ArgSet::new().operand(self.path().display().to_string()),
        );
        self.exec.execute(&inv, EXIT_OK)?;
        ui::success(&format!("agent {} deleted", self.path().display()));
        Ok(Outcome::Changed)
    }

    pub fn start(&self) -> Result<Outcome> {
        if !probe::agent_exists(self.exec, self.path()) {
            ui::info(&format!(
                "agent {} does not exist - nothing to do",
                self.path().display()
            ));
            return Ok(Outcome::Unchanged);
        }
        if probe::agent_running(self.exec, self.path()) {
            ui::info(&format!(
                "agent {} is running - nothing to do",
                self.path().display()
            ));
            return Ok(Outcome::Unchanged);
        }

        let inv = CommandInvocation::new(
            Tool::Dsccagent,
            "start",
            ArgSet::new().operand(self.path().display().to_string()),
        );
        self.exec.execute(&inv, EXIT_OK)?;
        ui::success(&format!("agent {} started", self.path().display()));
        Ok(Outcome::Changed)
    }

    pub fn stop(&self) -> Result<Outcome> {
        if !probe::agent_running(self.exec, self.path()) {
            ui::info(&format!(
                "agent {} not running - nothing to do",
                self.path().display()
            ));
            return Ok(Outcome::Unchanged);
        }

        let inv = CommandInvocation::new(
            Tool::Dsccagent,
            "stop",
            ArgSet::new().operand(self.path().display().to_string()),
        );
        self.exec.execute(&inv, EXIT_OK)?;
        ui::success(&format!("agent {} stopped", self.path().display()));
        Ok(Outcome::Changed)
    }

    /// Configure the agent as an SNMP agent. Ambiguous probe state skips
    /// the reconfiguration: re-running `enable-snmp` against an agent we
    /// cannot read is riskier than leaving it for the next converge.
    pub fn enable_snmp(&self) -> Result<Outcome> {
        let Some(snmp) = &self.cfg.snmp else {
            return Ok(Outcome::Unchanged);
        };

        match probe::agent_snmp(self.exec, self.path()) {
            SnmpState::Enabled => {
                ui::info(&format!(
                    "agent {} SNMP already configured - nothing to do",
                    self.path().display()
                ));
                Ok(Outcome::Unchanged)
            }
            SnmpState::Unknown => {
                ui::warning(&format!(
                    "agent {} SNMP state unknown - skipping",
                    self.path().display()
                ));
                Ok(Outcome::Unchanged)
            }
            SnmpState::Disabled => {
                let args = ArgSet::new()
                    .switch("-v3", snmp.v3)
                    .opt("--snmp-port", snmp.snmp_port)
                    .opt("--ds-port", snmp.ds_port)
                    .operand(self.path().display().to_string());
                let inv = CommandInvocation::new(Tool::Dsccagent, "enable_snmp", args);
                self.exec.execute(&inv, EXIT_OK)?;
                ui::success(&format!("agent {} SNMP configured", self.path().display()));
                Ok(Outcome::Changed)
            }
        }
    }

    pub fn disable_snmp(&self) -> Result<Outcome> {
        match probe::agent_snmp(self.exec, self.path()) {
            SnmpState::Enabled => {
                let inv = CommandInvocation::new(
                    Tool::Dsccagent,
                    "disable_snmp",
                    ArgSet::new().operand(self.path().display().to_string()),
                );
                self.exec.execute(&inv, EXIT_OK)?;
                ui::success(&format!("agent {} SNMP unconfigured", self.path().display()));
                Ok(Outcome::Changed)
            }
            _ => {
                ui::info(&format!(
                    "agent {} SNMP not configured - nothing to do",
                    self.path().display()
                ));
                Ok(Outcome::Unchanged)
            }
        }
    }

    /// Register the agent as an OS service. The vendor tool gives no
    /// probe for service registration, so this only requires the agent
    /// to exist and reports a change whenever it runs.
    pub fn enable_service(&self) -> Result<Outcome> {
        if !probe::agent_exists(self.exec, self.path()) {
            ui::info(&format!(
                "agent {} does not exist - nothing to do",
                self.path().display()
            ));
            return Ok(Outcome::Unchanged);
        }

        let inv = CommandInvocation::new(
            Tool::Dsccagent,
            "enable_service",
            ArgSet::new().operand(self.path().display().to_string()),
        );
        self.exec.execute(&inv, EXIT_OK)?;
        ui::success(&format!("agent {} registered as a service", self.path().display()));
        Ok(Outcome::Changed)
    }

    pub fn disable_service(&self) -> Result<Outcome> {
        if !probe::agent_exists(self.exec, self.path()) {
            ui::info(&format!(
                "agent {} does not exist - nothing to do",
                self.path().display()
            ));
            return Ok(Outcome::Unchanged);
        }

        let inv = CommandInvocation::new(
            Tool::Dsccagent,
            "disable_service",
            ArgSet::new().operand(self.path().display().to_string()),
        );
        self.exec.execute(&inv, EXIT_OK)?;
        ui::success(&format!("agent {} service unregistered", self.path().display()));
        Ok(Outcome::Changed)
    }
}
