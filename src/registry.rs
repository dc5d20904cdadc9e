//! Querying the DSCC registry.
//!
//! `dsccreg list-agents` / `list-servers` are the only way to learn
//! what is registered; membership is decided by comparing the listed
//! installation path (`ipath`) column.

use crate::error::{DseectlError, Result};
use crate::exec::{ArgSet, CommandInvocation, EXIT_OK, Executor, Tool};
use crate::parse::{self, TableRow};
use crate::secrets::Secret;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryKind {
    Agents,
    Servers,
}

impl RegistryKind {
    pub fn list_subcommand(self) -> &'static str {
        match self {
            Self::Agents => "list_agents",
            Self::Servers => "list_servers",
        }
    }
}

impl fmt::Display for RegistryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Agents => f.write_str("agents"),
            Self::Servers => f.write_str("servers"),
        }
    }
}

impl FromStr for RegistryKind {
    type Err = DseectlError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "agents" => Ok(Self::Agents),
            "servers" => Ok(Self::Servers),
            other => Err(DseectlError::InvalidRegistryKind(other.to_string())),
        }
    }
}

/// One registry row. `ipath` is the key the reconcilers care about; the
/// remaining columns ride along untyped.
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub ipath: String,
    pub fields: TableRow,
}

impl RegistryEntry {
    fn from_row(row: TableRow) -> Self {
        Self {
            ipath: row.get("ipath").cloned().unwrap_or_default(),
            fields: row,
        }
    }
}

/// List the registered entries of one kind. The admin credential file
/// exists only for the duration of the list command.
pub fn entries(exec: &dyn Executor, admin: &Secret, kind: RegistryKind) -> Result<Vec<RegistryEntry>> {
    admin.with_file(|pwfile| {
        let args = ArgSet::new().opt("-w", Some(pwfile.display()));
        let inv = CommandInvocation::new(Tool::Dsccreg, kind.list_subcommand(), args);
        let out = exec.execute(&inv, EXIT_OK)?;
        Ok(parse::parse_table(&out.stdout)
            .into_iter()
            .map(RegistryEntry::from_row)
            .collect())
    })
}

/// True iff any listed entry's `ipath` equals `path`.
pub fn try_member_of(
    exec: &dyn Executor,
    admin: &Secret,
    kind: RegistryKind,
    path: &Path,
) -> Result<bool> {
    let listed = entries(exec, admin, kind)?;
    Ok(listed.iter().any(|entry| Path::new(&entry.ipath) == path))
}

/// Fail-safe membership probe: any listing failure reads as "not
/// registered".
pub fn member_of(exec: &dyn Executor, admin: &Secret, kind: RegistryKind, path: &Path) -> bool {
    try_member_of(exec, admin, kind, path).unwrap_or(false)
}
