//! Building vendor tool invocations.
//!
//! Flags are emitted in the order the builder methods are called, which
//! each call site keeps fixed — the vendor tools are positionally
//! sensitive about trailing operands, so operands always land last no
//! matter when they were added.

use crate::constants::{PRODUCT_DIR, SYSTEM_BIN_DIRS};
use crate::error::{DseectlError, Result};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// The vendor command-line tools this crate drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    /// Local Directory Server instance administration.
    Dsadm,
    /// DSCC agent instance administration.
    Dsccagent,
    /// DSCC registry entry administration.
    Dsccreg,
    /// DSCC registry bootstrap.
    Dsccsetup,
    /// Directory Server configuration (`cn=config`).
    Dsconf,
}

impl Tool {
    pub fn name(self) -> &'static str {
        match self {
            Self::Dsadm => "dsadm",
            Self::Dsccagent => "dsccagent",
            Self::Dsccreg => "dsccreg",
            Self::Dsccsetup => "dsccsetup",
            Self::Dsconf => "dsconf",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Normalize a symbolic subcommand to the tools' dash convention:
/// `add_agent` becomes `add-agent`.
pub fn dasherize(subcommand: &str) -> String {
    subcommand.replace('_', "-")
}

/// Ordered argument list under construction. Valued flags contribute
/// `token value` only when the value is present; switches contribute the
/// bare token only when enabled (a switch never takes a value); operands
/// are appended after every flag.
#[derive(Debug, Clone, Default)]
pub struct ArgSet {
    flags: Vec<String>,
    operands: Vec<String>,
}

impl ArgSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opt(mut self, token: &str, value: Option<impl fmt::Display>) -> Self {
        if let Some(value) = value {
            self.flags.push(token.to_string());
            self.flags.push(value.to_string());
        }
        self
    }

    pub fn switch(mut self, token: &str, on: bool) -> Self {
        if on {
            self.flags.push(token.to_string());
        }
        self
    }

    /// Append a free-form option string, split the way a shell would.
    pub fn extra(mut self, raw: Option<&str>) -> Result<Self> {
        if let Some(raw) = raw {
            let pieces = shlex::split(raw).ok_or_else(|| {
                DseectlError::Validation(format!("unparseable extra arguments: {raw}"))
            })?;
            self.flags.extend(pieces);
        }
        Ok(self)
    }

    pub fn operand(mut self, value: impl Into<String>) -> Self {
        self.operands.push(value.into());
        self
    }

    pub fn into_args(self) -> Vec<String> {
        let mut args = self.flags;
        args.extend(self.operands);
        args
    }
}

/// One fully built vendor tool call. The tool stays symbolic — binary
/// resolution happens per execution attempt, so a tool that lands on
/// PATH between retries is picked up.
#[derive(Debug, Clone)]
pub struct CommandInvocation {
    pub tool: Tool,
    pub subcommand: String,
    pub args: Vec<String>,
}

impl CommandInvocation {
    pub fn new(tool: Tool, subcommand: &str, args: ArgSet) -> Self {
        Self {
            tool,
            subcommand: dasherize(subcommand),
            args: args.into_args(),
        }
    }

    pub fn command_line(&self) -> String {
        let mut line = format!("{} {}", self.tool, self.subcommand);
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Locates vendor tool binaries: standard system directories first, then
/// the product bin directories under the install root, then the
/// inherited PATH. First executable match wins.
#[derive(Debug, Clone)]
pub struct Toolbox {
    install_dir: PathBuf,
}

impl Toolbox {
    pub fn new(install_dir: impl Into<PathBuf>) -> Self {
        Self {
            install_dir: install_dir.into(),
        }
    }

    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    pub fn resolve(&self, tool: Tool) -> Result<PathBuf> {
        let name = tool.name();

        for dir in SYSTEM_BIN_DIRS {
            let candidate = Path::new(dir).join(name);
            if is_executable(&candidate) {
                return Ok(candidate);
            }
        }

        for sub in ["bin", "dsrk/bin"] {
            let candidate = self.install_dir.join(PRODUCT_DIR).join(sub).join(name);
            if is_executable(&candidate) {
                return Ok(candidate);
            }
        }

        which::which(name).map_err(|_| DseectlError::ToolMissing(name.to_string()))
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
