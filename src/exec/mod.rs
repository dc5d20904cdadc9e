//! Serialized, retrying execution of vendor tool invocations.
//!
//! Everything that touches a vendor binary goes through [`Executor`];
//! the production implementation is [`ProcessInvoker`]. Probers and
//! reconcilers only see the trait, so tests drive them with stubs.

pub mod command;
pub mod gate;

pub use command::{ArgSet, CommandInvocation, Tool, Toolbox, dasherize};
pub use gate::ExecutionGate;

use crate::constants::{COMMAND_TIMEOUT_SECS, RETRY_ATTEMPTS};
use crate::error::{DseectlError, Result};
use crate::ui;
use std::io::Read;
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// The acceptable exit set for plain mutating subcommands.
pub const EXIT_OK: &[i32] = &[0];

/// Raw result of one vendor tool run.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    pub status: i32,
    pub elapsed: Duration,
}

/// The single seam through which external commands run.
pub trait Executor: Send + Sync {
    /// Execute `invocation`, failing with `ExecutionFailed` when the
    /// exit code is outside `acceptable`.
    fn execute(&self, invocation: &CommandInvocation, acceptable: &[i32])
    -> Result<ExecutionResult>;
}

/// Run an invocation and then a cleanup hook, exactly once, regardless
/// of how the execution resolved.
pub fn execute_insured(
    exec: &dyn Executor,
    invocation: &CommandInvocation,
    acceptable: &[i32],
    cleanup: impl FnOnce(),
) -> Result<ExecutionResult> {
    let result = exec.execute(invocation, acceptable);
    cleanup();
    result
}

/// Bounded exponential backoff for the tool-missing transient class.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    /// Scale of one backoff step; the delay before retrying attempt `n`
    /// is `unit * 4^n`. Tests run with a zero unit.
    pub unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: RETRY_ATTEMPTS,
            unit: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn delay(&self, attempt: u32) -> Duration {
        self.unit * 4u32.saturating_pow(attempt)
    }
}

/// Drive `op` until it succeeds, fails non-retryably, or exhausts the
/// attempt budget. Only `ToolMissing` is retried.
pub fn retry_tool_missing<T>(
    policy: &RetryPolicy,
    mut sleep: impl FnMut(Duration),
    mut op: impl FnMut() -> Result<T>,
) -> Result<T> {
    let mut attempt = 1;
    loop {
        match op() {
            Err(e) if e.is_retryable() && attempt < policy.attempts => {
                ui::warning(&format!(
                    "{} (attempt {}/{}), retrying",
                    e, attempt, policy.attempts
                ));
                sleep(policy.delay(attempt));
                attempt += 1;
            }
            other => return other,
        }
    }
}

pub type Logger = Box<dyn Fn(&str) + Send + Sync>;

/// Executes invocations against the real vendor binaries: one at a time
/// through the [`ExecutionGate`], resolving the binary fresh on every
/// attempt, retrying only when the tool is missing.
pub struct ProcessInvoker {
    toolbox: Toolbox,
    gate: ExecutionGate,
    retry: RetryPolicy,
    timeout: Duration,
    logger: Logger,
}

impl ProcessInvoker {
    pub fn new(toolbox: Toolbox) -> Self {
        Self {
            toolbox,
            gate: ExecutionGate::in_process(),
            retry: RetryPolicy::default(),
            timeout: Duration::from_secs(COMMAND_TIMEOUT_SECS),
            logger: Box::new(|line| ui::info(line)),
        }
    }

    pub fn with_gate(mut self, gate: ExecutionGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    fn attempt_once(
        &self,
        invocation: &CommandInvocation,
        acceptable: &[i32],
    ) -> Result<ExecutionResult> {
        let program = self.toolbox.resolve(invocation.tool)?;
        let label = invocation.command_line();
        ui::debug(&format!("run: {}", label));

        let mut cmd = Command::new(&program);
        cmd.arg(&invocation.subcommand).args(&invocation.args);

        let started = Instant::now();
        let output = run_with_timeout(&mut cmd, self.timeout, &label, invocation.tool)?;
        let status = output.status.code().unwrap_or(-1);
        let result = ExecutionResult {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            status,
            elapsed: started.elapsed(),
        };

        if acceptable.contains(&status) {
            Ok(result)
        } else {
            Err(DseectlError::ExecutionFailed {
                command: label,
                status,
                stderr: result.stderr.trim().to_string(),
            })
        }
    }
}

impl Executor for ProcessInvoker {
    fn execute(
        &self,
        invocation: &CommandInvocation,
        acceptable: &[i32],
    ) -> Result<ExecutionResult> {
        let _guard = self.gate.acquire()?;
        let result = retry_tool_missing(&self.retry, thread::sleep, || {
            self.attempt_once(invocation, acceptable)
        })?;
        (self.logger)(result.stdout.trim_end());
        Ok(result)
    }
}

/// Spawn with piped output and a wall-clock bound. A timeout kills the
/// child and fails non-retryably.
fn run_with_timeout(
    cmd: &mut Command,
    timeout: Duration,
    label: &str,
    tool: Tool,
) -> Result<Output> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            DseectlError::ToolMissing(tool.name().to_string())
        } else {
            DseectlError::Other(format!("failed to spawn '{}': {}", label, e))
        }
    })?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| DseectlError::Other(format!("failed to capture stdout of '{}'", label)))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| DseectlError::Other(format!("failed to capture stderr of '{}'", label)))?;

    let stdout_thread = thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = std::io::BufReader::new(stdout).read_to_end(&mut buf);
        buf
    });
    let stderr_thread = thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = std::io::BufReader::new(stderr).read_to_end(&mut buf);
        buf
    });

    let start = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if start.elapsed() > timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    let _ = stdout_thread.join();
                    let _ = stderr_thread.join();
                    return Err(DseectlError::CommandTimeout {
                        command: label.to_string(),
                        seconds: timeout.as_secs(),
                    });
                }
                thread::sleep(Duration::from_millis(50));
            }
            Err(e) => {
                return Err(DseectlError::Other(format!(
                    "failed waiting on '{}': {}",
                    label, e
                )));
            }
        }
    };

    let stdout = stdout_thread.join().unwrap_or_default();
    let stderr = stderr_thread.join().unwrap_or_default();

    Ok(Output {
        status,
        stdout,
        stderr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn delay_follows_powers_of_four() {
        let policy = RetryPolicy {
            attempts: 4,
            unit: Duration::from_secs(1),
        };
        assert_eq!(policy.delay(1), Duration::from_secs(4));
        assert_eq!(policy.delay(2), Duration::from_secs(16));
        assert_eq!(policy.delay(3), Duration::from_secs(64));
    }

    #[test]
    fn tool_missing_is_attempted_exactly_the_budget() {
        let policy = RetryPolicy {
            attempts: 4,
            unit: Duration::from_secs(1),
        };
        let attempts = Mutex::new(0u32);
        let delays = Mutex::new(Vec::new());

        let result: Result<()> = retry_tool_missing(
            &policy,
            |d| delays.lock().unwrap().push(d.as_secs()),
            || {
                *attempts.lock().unwrap() += 1;
                Err(DseectlError::ToolMissing("dsadm".into()))
            },
        );

        assert!(matches!(result, Err(DseectlError::ToolMissing(_))));
        assert_eq!(*attempts.lock().unwrap(), 4);
        assert_eq!(*delays.lock().unwrap(), vec![4, 16, 64]);
    }

    #[test]
    fn non_retryable_failures_surface_immediately() {
        let policy = RetryPolicy {
            attempts: 4,
            unit: Duration::ZERO,
        };
        let attempts = Mutex::new(0u32);

        let result: Result<()> = retry_tool_missing(
            &policy,
            |_| {},
            || {
                *attempts.lock().unwrap() += 1;
                Err(DseectlError::ExecutionFailed {
                    command: "dsadm create".into(),
                    status: 1,
                    stderr: "bad flag".into(),
                })
            },
        );

        assert!(matches!(result, Err(DseectlError::ExecutionFailed { .. })));
        assert_eq!(*attempts.lock().unwrap(), 1);
    }

    #[test]
    fn recovery_mid_budget_returns_the_result() {
        let policy = RetryPolicy {
            attempts: 4,
            unit: Duration::ZERO,
        };
        let attempts = Mutex::new(0u32);

        let result = retry_tool_missing(
            &policy,
            |_| {},
            || {
                let mut n = attempts.lock().unwrap();
                *n += 1;
                if *n < 3 {
                    Err(DseectlError::ToolMissing("dsconf".into()))
                } else {
                    Ok(*n)
                }
            },
        );

        assert_eq!(result.unwrap(), 3);
    }

    #[cfg(unix)]
    fn fake_toolbox(script: &str) -> (tempfile::TempDir, Toolbox) {
        use std::os::unix::fs::PermissionsExt;
        let root = tempfile::tempdir().unwrap();
        let bin = root.path().join("dsee7/bin");
        std::fs::create_dir_all(&bin).unwrap();
        let tool = bin.join("dsadm");
        std::fs::write(&tool, script).unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();
        let toolbox = Toolbox::new(root.path());
        (root, toolbox)
    }

    #[cfg(unix)]
    #[test]
    fn invoker_logs_stdout_of_successful_runs() {
        use std::sync::Arc;
        let (_root, toolbox) = fake_toolbox("#!/bin/sh\necho \"State: Stopped\"\n");
        let logged = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&logged);
        let invoker = ProcessInvoker::new(toolbox)
            .with_logger(Box::new(move |line| sink.lock().unwrap().push(line.to_string())));

        let inv = CommandInvocation::new(Tool::Dsadm, "info", ArgSet::new().operand("/opt/i"));
        let result = invoker.execute(&inv, EXIT_OK).unwrap();

        assert_eq!(result.status, 0);
        assert_eq!(*logged.lock().unwrap(), vec!["State: Stopped".to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn exit_codes_outside_the_allow_list_fail() {
        let (_root, toolbox) = fake_toolbox("#!/bin/sh\necho nope >&2\nexit 125\n");
        let invoker = ProcessInvoker::new(toolbox).with_logger(Box::new(|_| {}));
        let inv = CommandInvocation::new(Tool::Dsadm, "info", ArgSet::new().operand("/opt/i"));

        // 125 means "no such instance" for info probes...
        let result = invoker.execute(&inv, &[0, 125, 154]).unwrap();
        assert_eq!(result.status, 125);
        assert_eq!(result.stderr.trim(), "nope");

        // ...but is a hard failure for anything else.
        match invoker.execute(&inv, EXIT_OK) {
            Err(DseectlError::ExecutionFailed { status, stderr, .. }) => {
                assert_eq!(status, 125);
                assert_eq!(stderr, "nope");
            }
            other => panic!("expected ExecutionFailed, got {:?}", other.map(|r| r.status)),
        }
    }

    #[test]
    fn insured_cleanup_runs_exactly_once_on_failure() {
        struct Failing;
        impl Executor for Failing {
            fn execute(
                &self,
                invocation: &CommandInvocation,
                _acceptable: &[i32],
            ) -> Result<ExecutionResult> {
                Err(DseectlError::ExecutionFailed {
                    command: invocation.command_line(),
                    status: 2,
                    stderr: String::new(),
                })
            }
        }

        let mut cleanups = 0;
        let inv = CommandInvocation::new(Tool::Dsconf, "create_suffix", ArgSet::new());
        let result = execute_insured(&Failing, &inv, EXIT_OK, || cleanups += 1);
        assert!(result.is_err());
        assert_eq!(cleanups, 1);
    }

    #[cfg(unix)]
    #[test]
    fn run_with_timeout_captures_output() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo out; echo err >&2"]);
        let output =
            run_with_timeout(&mut cmd, Duration::from_secs(10), "sh -c", Tool::Dsadm).unwrap();
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout), "out\n");
        assert_eq!(String::from_utf8_lossy(&output.stderr), "err\n");
    }

    #[cfg(unix)]
    #[test]
    fn run_with_timeout_kills_hung_commands() {
        let mut cmd = Command::new("sleep");
        cmd.arg("30");
        let err = run_with_timeout(&mut cmd, Duration::from_millis(200), "sleep 30", Tool::Dsadm)
            .unwrap_err();
        assert!(matches!(err, DseectlError::CommandTimeout { .. }));
    }
}
