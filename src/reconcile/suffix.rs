//! Directory suffixes and LDIF population, managed through `dsconf`.

use super::Outcome;
use crate::config::types::SuffixConfig;
use crate::error::{DseectlError, Result};
use crate::exec::{ArgSet, CommandInvocation, EXIT_OK, Executor, Tool};
use crate::probe;
use crate::secrets::Secret;
use crate::ui;

pub struct SuffixReconciler<'a> {
    exec: &'a dyn Executor,
    cfg: &'a SuffixConfig,
    admin: &'a Secret,
}

impl<'a> SuffixReconciler<'a> {
    pub fn new(exec: &'a dyn Executor, cfg: &'a SuffixConfig, admin: &'a Secret) -> Self {
        Self { exec, cfg, admin }
    }

    fn created(&self) -> bool {
        probe::suffix_created(
            self.exec,
            self.admin,
            self.cfg.hostname.as_deref(),
            self.cfg.port,
            &self.cfg.dn,
        )
    }

    pub fn create(&self) -> Result<Outcome> {
        if self.created() {
            ui::info(&format!("suffix {} already created - nothing to do", self.cfg.dn));
            return Ok(Outcome::Unchanged);
        }

        self.admin.with_file(|pwfile| {
            let args = ArgSet::new()
                .opt("-h", self.cfg.hostname.as_deref())
                .opt("-p", self.cfg.port)
                .opt("-B", self.cfg.db_name.as_deref())
                .opt("-L", self.cfg.db_path.as_ref().map(|p| p.display()))
                .switch("-c", self.cfg.accept_cert)
                .switch("-N", self.cfg.no_top_entry)
                .opt("-w", Some(pwfile.display()))
                .operand(self.cfg.dn.clone());
            let inv = CommandInvocation::new(Tool::Dsconf, "create_suffix", args);
            self.exec.execute(&inv, EXIT_OK).map(|_| ())
        })?;

        ui::success(&format!("suffix {} created", self.cfg.dn));
        Ok(Outcome::Changed)
    }

    pub fn delete(&self) -> Result<Outcome> {
        if !self.created() {
            ui::info(&format!("suffix {} does not exist - nothing to do", self.cfg.dn));
            return Ok(Outcome::Unchanged);
        }

        let args = ArgSet::new()
            .opt("-h", self.cfg.hostname.as_deref())
            .opt("-p", self.cfg.port)
            .operand(self.cfg.dn.clone());
        let inv = CommandInvocation::new(Tool::Dsconf, "delete_suffix", args);
        self.exec.execute(&inv, EXIT_OK)?;
        ui::success(&format!("suffix {} deleted", self.cfg.dn));
        Ok(Outcome::Changed)
    }

    /// Populate the suffix from the configured LDIF file. Runs only
    /// while the suffix still holds nothing but its top entry; a
    /// populated (or unreadable) suffix is left alone.
    pub fn import(&self) -> Result<Outcome> {
        let Some(ldif) = &self.cfg.ldif_file else {
            return Err(DseectlError::Validation(format!(
                "suffix {} has no ldif_file to import",
                self.cfg.dn
            )));
        };

        if !probe::suffix_empty(
            self.exec,
            self.admin,
            self.cfg.hostname.as_deref(),
            self.cfg.port,
        ) {
            ui::info(&format!("suffix {} already populated - nothing to do", self.cfg.dn));
            return Ok(Outcome::Unchanged);
        }

        self.admin.with_file(|pwfile| {
            let args = ArgSet::new()
                .opt("-h", self.cfg.hostname.as_deref())
                .opt("-p", self.cfg.port)
                .switch("-a", self.cfg.async_import)
                .switch("-K", self.cfg.incremental)
                .opt("-x", self.cfg.exclude_dn.as_deref())
                .extra(self.cfg.import_opts.as_deref())?
                .opt("-w", Some(pwfile.display()))
                .operand(ldif.display().to_string())
                .operand(self.cfg.dn.clone());
            let inv = CommandInvocation::new(Tool::Dsconf, "import", args);
            self.exec.execute(&inv, EXIT_OK).map(|_| ())
        })?;

        ui::success(&format!("suffix {} populated from {}", self.cfg.dn, ldif.display()));
        Ok(Outcome::Changed)
    }
}
