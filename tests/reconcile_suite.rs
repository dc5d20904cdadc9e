// End-to-end reconciler behavior against a scripted executor: probe,
// decide, act once, and never leave a credential file behind.

use dseectl::config::types::{AgentConfig, InstanceConfig, RegistrationConfig, SnmpConfig};
use dseectl::error::{DseectlError, Result};
use dseectl::exec::{CommandInvocation, ExecutionResult, Executor};
use dseectl::reconcile::agent::AgentReconciler;
use dseectl::reconcile::instance::InstanceReconciler;
use dseectl::reconcile::registration::RegistrationReconciler;
use dseectl::registry::RegistryKind;
use dseectl::secrets::Secret;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// One recorded vendor call: the rendered command line plus the content
/// of every file argument that existed at execution time (password
/// files are gone afterwards, so they must be read here).
#[derive(Debug, Clone)]
struct RecordedCall {
    line: String,
    args: Vec<String>,
    file_contents: BTreeMap<String, String>,
}

/// Scripted stand-in for the process invoker. `dsadm info` reports the
/// instance as absent until a `create` has been recorded; mutating
/// subcommands can be told to fail.
struct ScriptedExecutor {
    calls: Mutex<Vec<RecordedCall>>,
    created: AtomicBool,
    registered: Vec<String>,
    fail_mutations: bool,
    agent_info: Option<&'static str>,
}

impl ScriptedExecutor {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            created: AtomicBool::new(false),
            registered: Vec::new(),
            fail_mutations: false,
            agent_info: None,
        }
    }

    fn failing_mutations() -> Self {
        Self {
            fail_mutations: true,
            ..Self::new()
        }
    }

    fn with_registered(paths: &[&str]) -> Self {
        Self {
            registered: paths.iter().map(|p| p.to_string()).collect(),
            ..Self::new()
        }
    }

    fn with_agent_info(info: &'static str) -> Self {
        Self {
            agent_info: Some(info),
            ..Self::new()
        }
    }

    fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn mutations(&self) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| !c.line.contains(" info") && !c.line.contains(" list-"))
            .collect()
    }

    fn ok(stdout: String) -> ExecutionResult {
        ExecutionResult {
            stdout,
            stderr: String::new(),
            status: 0,
            elapsed: Duration::ZERO,
        }
    }
}

impl Executor for ScriptedExecutor {
    fn execute(
        &self,
        invocation: &CommandInvocation,
        _acceptable: &[i32],
    ) -> Result<ExecutionResult> {
        let mut file_contents = BTreeMap::new();
        for arg in &invocation.args {
            let path = Path::new(arg);
            if path.is_file()
                && let Ok(content) = std::fs::read_to_string(path)
            {
                file_contents.insert(arg.clone(), content);
            }
        }
        self.calls.lock().unwrap().push(RecordedCall {
            line: invocation.command_line(),
            args: invocation.args.clone(),
            file_contents,
        });

        match invocation.subcommand.as_str() {
            "info" => {
                if invocation.tool.name() == "dsccagent" {
                    return Ok(Self::ok(self.agent_info.unwrap_or("").to_string()));
                }
                if self.created.load(Ordering::SeqCst) {
                    let path = invocation.args.last().cloned().unwrap_or_default();
                    Ok(Self::ok(format!("Instance Path: {}\nState: Stopped\n", path)))
                } else {
                    Ok(Self::ok("No such instance\n".to_string()))
                }
            }
            "list-agents" | "list-servers" => {
                let mut stdout = String::from("Hostname  Port  iPath\n");
                for path in &self.registered {
                    stdout.push_str(&format!("host1  3997  {}\n", path));
                }
                stdout.push_str(&format!("{} agent(s) found.\n", self.registered.len()));
                Ok(Self::ok(stdout))
            }
            _ if self.fail_mutations => Err(DseectlError::ExecutionFailed {
                command: invocation.command_line(),
                status: 1,
                stderr: "simulated vendor failure".into(),
            }),
            "create" => {
                self.created.store(true, Ordering::SeqCst);
                Ok(Self::ok(String::new()))
            }
            _ => Ok(Self::ok(String::new())),
        }
    }
}

fn instance_config(path: &str, ldap_port: Option<u16>) -> InstanceConfig {
    InstanceConfig {
        path: PathBuf::from(path),
        below: None,
        no_inter: true,
        user_name: None,
        group_name: None,
        hostname: None,
        ldap_port,
        ldaps_port: None,
        dn: None,
        safe_mode: false,
        schema_push: false,
        force: false,
        start: true,
    }
}

fn agent_config(path: &str) -> AgentConfig {
    AgentConfig {
        path: PathBuf::from(path),
        no_inter: true,
        port: Some(3997),
        start: true,
        snmp: Some(SnmpConfig {
            v3: false,
            snmp_port: Some(3996),
            ds_port: None,
        }),
        register_service: false,
    }
}

#[test]
fn create_builds_the_documented_invocation() {
    let exec = ScriptedExecutor::new();
    let admin = Secret::new("admin", "secret123");
    let cfg = instance_config("/opt/dsInst", Some(389));

    let outcome = InstanceReconciler::new(&exec, &cfg, &admin).create().unwrap();
    assert!(outcome.changed());

    let mutations = exec.mutations();
    assert_eq!(mutations.len(), 1);
    let create = &mutations[0];
    assert!(create.line.starts_with("dsadm create"));

    // -p 389 is present and the trailing operand is the instance path.
    let p_at = create.args.iter().position(|a| a == "-p").unwrap();
    assert_eq!(create.args[p_at + 1], "389");
    assert_eq!(create.args.last().unwrap(), "/opt/dsInst");

    // The -w file held the admin password during the call and is gone now.
    let w_at = create.args.iter().position(|a| a == "-w").unwrap();
    let pwfile = &create.args[w_at + 1];
    assert_eq!(create.file_contents[pwfile], "secret123");
    assert!(!Path::new(pwfile).exists());
}

#[test]
fn create_twice_executes_the_external_command_at_most_once() {
    let exec = ScriptedExecutor::new();
    let admin = Secret::new("admin", "secret123");
    let cfg = instance_config("/opt/dsInst", Some(389));
    let rec = InstanceReconciler::new(&exec, &cfg, &admin);

    assert!(rec.create().unwrap().changed());
    assert!(!rec.create().unwrap().changed());

    assert_eq!(exec.mutations().len(), 1);
}

#[test]
fn secrets_do_not_survive_a_failed_command() {
    let exec = ScriptedExecutor::failing_mutations();
    let admin = Secret::new("admin", "secret123");
    let cfg = instance_config("/opt/dsInst", Some(389));

    let err = InstanceReconciler::new(&exec, &cfg, &admin)
        .create()
        .unwrap_err();
    assert!(matches!(err, DseectlError::ExecutionFailed { .. }));

    let create = &exec.mutations()[0];
    let w_at = create.args.iter().position(|a| a == "-w").unwrap();
    let pwfile = &create.args[w_at + 1];
    assert_eq!(create.file_contents[pwfile], "secret123");
    assert!(!Path::new(pwfile).exists());
}

#[test]
fn start_only_runs_from_present_but_stopped() {
    let exec = ScriptedExecutor::new();
    let admin = Secret::new("admin", "secret123");
    let cfg = instance_config("/opt/dsInst", None);
    let rec = InstanceReconciler::new(&exec, &cfg, &admin);

    // Absent: no start.
    assert!(!rec.start().unwrap().changed());
    assert!(exec.mutations().is_empty());

    // Created (probe reports Stopped): start runs.
    rec.create().unwrap();
    assert!(rec.start().unwrap().changed());
    let lines: Vec<String> = exec.mutations().iter().map(|c| c.line.clone()).collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("dsadm start"));
}

#[test]
fn stop_is_a_noop_for_a_stopped_instance() {
    let exec = ScriptedExecutor::new();
    let admin = Secret::new("admin", "secret123");
    let cfg = instance_config("/opt/dsInst", None);
    let rec = InstanceReconciler::new(&exec, &cfg, &admin);

    rec.create().unwrap();
    // Probe says Stopped; stop must not execute.
    assert!(!rec.stop().unwrap().changed());
    assert_eq!(exec.mutations().len(), 1);
}

#[test]
fn registration_is_driven_by_registry_membership() {
    let registered = ScriptedExecutor::with_registered(&["/opt/dsee7/var/dcc/agent"]);
    let admin = Secret::new("admin", "secret123");
    let agent_pw = Secret::new("agent", "agentpw");
    let cfg = RegistrationConfig {
        kind: RegistryKind::Agents,
        path: PathBuf::from("/opt/dsee7/var/dcc/agent"),
        description: None,
        hostname: None,
        agent_port: None,
        dn: None,
        force: false,
    };

    let rec = RegistrationReconciler::new(&registered, &cfg, &admin, &agent_pw);
    assert!(!rec.add().unwrap().changed());
    assert!(registered.mutations().is_empty());

    let empty = ScriptedExecutor::new();
    let rec = RegistrationReconciler::new(&empty, &cfg, &admin, &agent_pw);
    assert!(rec.add().unwrap().changed());
    let mutations = empty.mutations();
    assert_eq!(mutations.len(), 1);
    assert!(mutations[0].line.starts_with("dsccreg add-agent"));
    // Both credential files were live during the call.
    let g_at = mutations[0].args.iter().position(|a| a == "-G").unwrap();
    let w_at = mutations[0].args.iter().position(|a| a == "-w").unwrap();
    assert_eq!(mutations[0].file_contents[&mutations[0].args[g_at + 1]], "agentpw");
    assert_eq!(mutations[0].file_contents[&mutations[0].args[w_at + 1]], "secret123");
}

#[test]
fn ambiguous_snmp_state_skips_reconfiguration() {
    let exec = ScriptedExecutor::with_agent_info("Instance Path: /opt/agent\nState: Running\n");
    let agent_pw = Secret::new("agent", "agentpw");
    let cfg = agent_config("/opt/agent");

    let rec = AgentReconciler::new(&exec, &cfg, &agent_pw);
    assert!(!rec.enable_snmp().unwrap().changed());
    assert!(exec.mutations().is_empty());
}

#[test]
fn disabled_snmp_state_configures_the_agent() {
    let exec = ScriptedExecutor::with_agent_info(
        "Instance Path: /opt/agent\nState: Running\nSNMP port: Disabled\n",
    );
    let agent_pw = Secret::new("agent", "agentpw");
    let cfg = agent_config("/opt/agent");

    let rec = AgentReconciler::new(&exec, &cfg, &agent_pw);
    assert!(rec.enable_snmp().unwrap().changed());
    let mutations = exec.mutations();
    assert_eq!(mutations.len(), 1);
    assert!(mutations[0].line.starts_with("dsccagent enable-snmp"));
    assert!(mutations[0].args.contains(&"--snmp-port".to_string()));
}
