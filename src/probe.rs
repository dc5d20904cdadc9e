//! Read-only probes answering idempotency questions.
//!
//! A probe runs an `info`-class subcommand and parses the result; the
//! boolean predicates on top of it never propagate errors. A check that
//! cannot determine state must not assume the dangerous answer, so
//! every failure degrades to "absent / not running / not stopped" — the
//! reading that causes a redundant (idempotent) action rather than a
//! skipped one. SNMP is the inversion: skipping a reconfiguration on
//! ambiguous state is the safer choice, so ambiguity is a distinct
//! [`SnmpState::Unknown`].

use crate::constants::INFO_EXIT_CODES;
use crate::error::Result;
use crate::exec::{ArgSet, CommandInvocation, Executor, Tool};
use crate::parse::{self, StateMap};
use crate::secrets::Secret;
use std::path::Path;

/// `dsadm info <path>`.
pub fn instance_info(exec: &dyn Executor, path: &Path) -> Result<StateMap> {
    info(exec, Tool::Dsadm, path)
}

/// `dsccagent info <path>`.
pub fn agent_info(exec: &dyn Executor, path: &Path) -> Result<StateMap> {
    info(exec, Tool::Dsccagent, path)
}

fn info(exec: &dyn Executor, tool: Tool, path: &Path) -> Result<StateMap> {
    let inv = CommandInvocation::new(
        tool,
        "info",
        ArgSet::new().operand(path.display().to_string()),
    );
    let out = exec.execute(&inv, INFO_EXIT_CODES)?;
    Ok(parse::parse_info(&out.stdout))
}

/// `dsconf info -i -c [-h host] [-p port] -w <pwfile>`; the admin
/// credential only exists on disk for the duration of the probe.
pub fn suffix_info(
    exec: &dyn Executor,
    admin: &Secret,
    host: Option<&str>,
    port: Option<u16>,
) -> Result<StateMap> {
    admin.with_file(|pwfile| {
        let args = ArgSet::new()
            .switch("-i", true)
            .switch("-c", true)
            .opt("-h", host)
            .opt("-p", port)
            .opt("-w", Some(pwfile.display()));
        let inv = CommandInvocation::new(Tool::Dsconf, "info", args);
        let out = exec.execute(&inv, INFO_EXIT_CODES)?;
        Ok(parse::parse_info(&out.stdout))
    })
}

/// The designated identity key: present and equal to the expected path.
pub fn exists(state: &StateMap, expected_path: &Path) -> bool {
    state
        .get("instance_path")
        .map(|p| Path::new(p) == expected_path)
        .unwrap_or(false)
}

pub fn running(state: &StateMap) -> bool {
    state
        .get("state")
        .map(|s| s.eq_ignore_ascii_case("running"))
        .unwrap_or(false)
}

pub fn stopped(state: &StateMap) -> bool {
    state
        .get("state")
        .map(|s| s.eq_ignore_ascii_case("stopped"))
        .unwrap_or(false)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnmpState {
    Enabled,
    Disabled,
    Unknown,
}

/// The agent reports `SNMP port: Disabled` until SNMP is configured;
/// any other value is a live port.
pub fn snmp_state(state: &StateMap) -> SnmpState {
    match state.get("snmp_port") {
        None => SnmpState::Unknown,
        Some(v) if v.eq_ignore_ascii_case("disabled") => SnmpState::Disabled,
        Some(_) => SnmpState::Enabled,
    }
}

// Fail-safe predicate boundary: every error is caught here.

pub fn instance_exists(exec: &dyn Executor, path: &Path) -> bool {
    instance_info(exec, path)
        .map(|s| exists(&s, path))
        .unwrap_or(false)
}

pub fn instance_running(exec: &dyn Executor, path: &Path) -> bool {
    instance_info(exec, path).map(|s| running(&s)).unwrap_or(false)
}

pub fn instance_stopped(exec: &dyn Executor, path: &Path) -> bool {
    instance_info(exec, path).map(|s| stopped(&s)).unwrap_or(false)
}

pub fn agent_exists(exec: &dyn Executor, path: &Path) -> bool {
    agent_info(exec, path)
        .map(|s| exists(&s, path))
        .unwrap_or(false)
}

pub fn agent_running(exec: &dyn Executor, path: &Path) -> bool {
    agent_info(exec, path).map(|s| running(&s)).unwrap_or(false)
}

pub fn agent_stopped(exec: &dyn Executor, path: &Path) -> bool {
    agent_info(exec, path).map(|s| stopped(&s)).unwrap_or(false)
}

pub fn agent_snmp(exec: &dyn Executor, path: &Path) -> SnmpState {
    agent_info(exec, path)
        .map(|s| snmp_state(&s))
        .unwrap_or(SnmpState::Unknown)
}

/// True when the directory already serves `dn` as a suffix.
pub fn suffix_created(
    exec: &dyn Executor,
    admin: &Secret,
    host: Option<&str>,
    port: Option<u16>,
    dn: &str,
) -> bool {
    suffix_info(exec, admin, host, port)
        .map(|s| s.get("suffixes").map(String::as_str) == Some(dn))
        .unwrap_or(false)
}

/// True while the suffix holds fewer than two entries (the top entry
/// alone). A probe failure reads as "not empty" so a failed check never
/// triggers an import.
pub fn suffix_empty(
    exec: &dyn Executor,
    admin: &Secret,
    host: Option<&str>,
    port: Option<u16>,
) -> bool {
    suffix_info(exec, admin, host, port)
        .map(|s| {
            s.get("total_entries")
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(0)
                < 2
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DseectlError;
    use crate::exec::ExecutionResult;
    use std::time::Duration;

    struct StubExecutor(&'static str);

    impl Executor for StubExecutor {
        fn execute(
            &self,
            _invocation: &CommandInvocation,
            _acceptable: &[i32],
        ) -> Result<ExecutionResult> {
            Ok(ExecutionResult {
                stdout: self.0.to_string(),
                stderr: String::new(),
                status: 0,
                elapsed: Duration::ZERO,
            })
        }
    }

    struct FailingExecutor;

    impl Executor for FailingExecutor {
        fn execute(
            &self,
            _invocation: &CommandInvocation,
            _acceptable: &[i32],
        ) -> Result<ExecutionResult> {
            Err(DseectlError::Other("probe exploded".into()))
        }
    }

    const RUNNING_INSTANCE: &str = "\
Instance Path: /opt/dsInst
State: Running
Non-secure port: 389
";

    #[test]
    fn exists_requires_the_expected_path() {
        let exec = StubExecutor(RUNNING_INSTANCE);
        assert!(instance_exists(&exec, Path::new("/opt/dsInst")));
        assert!(!instance_exists(&exec, Path::new("/opt/other")));
    }

    #[test]
    fn running_and_stopped_match_case_insensitively() {
        let state = parse::parse_info("State: RUNNING\n");
        assert!(running(&state));
        assert!(!stopped(&state));
        let state = parse::parse_info("State: stopped\n");
        assert!(stopped(&state));
    }

    #[test]
    fn probe_failures_degrade_to_false() {
        let exec = FailingExecutor;
        let path = Path::new("/opt/dsInst");
        assert!(!instance_exists(&exec, path));
        assert!(!instance_running(&exec, path));
        assert!(!instance_stopped(&exec, path));
        assert!(!agent_exists(&exec, path));
    }

    #[test]
    fn snmp_failure_is_unknown_not_false() {
        assert_eq!(agent_snmp(&FailingExecutor, Path::new("/a")), SnmpState::Unknown);
        let disabled = StubExecutor("SNMP port: Disabled\nState: Running\n");
        assert_eq!(agent_snmp(&disabled, Path::new("/a")), SnmpState::Disabled);
        let enabled = StubExecutor("SNMP port: 3996\n");
        assert_eq!(agent_snmp(&enabled, Path::new("/a")), SnmpState::Enabled);
        let silent = StubExecutor("State: Running\n");
        assert_eq!(agent_snmp(&silent, Path::new("/a")), SnmpState::Unknown);
    }

    #[test]
    fn suffix_predicates_read_the_parsed_fields() {
        let admin = Secret::new("admin", "pw");
        let exec = StubExecutor("Suffixes: dc=example,dc=com\nTotal entries: 1\n");
        assert!(suffix_created(&exec, &admin, None, None, "dc=example,dc=com"));
        assert!(!suffix_created(&exec, &admin, None, None, "dc=other,dc=com"));
        assert!(suffix_empty(&exec, &admin, None, None));

        let populated = StubExecutor("Suffixes: dc=example,dc=com\nTotal entries: 2941\n");
        assert!(!suffix_empty(&populated, &admin, None, None));
        assert!(!suffix_empty(&FailingExecutor, &admin, None, None));
    }
}
