//! Desired-state records, deserialized from the YAML manifest.
//!
//! A record is immutable for the duration of one reconciliation call;
//! absent fields mean "let the vendor tool pick its default" unless a
//! constant from [`crate::constants`] says otherwise.

use crate::constants;
use crate::registry::RegistryKind;
use crate::secrets::Secret;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Root under which the vendor software is installed.
    #[serde(default = "default_install_dir")]
    pub install_dir: PathBuf,

    pub credentials: Credentials,

    /// DSCC registry bootstrap; absent means the registry is managed
    /// elsewhere.
    #[serde(default)]
    pub registry: Option<SetupConfig>,

    #[serde(default)]
    pub instances: Vec<InstanceConfig>,

    #[serde(default)]
    pub agents: Vec<AgentConfig>,

    #[serde(default)]
    pub registrations: Vec<RegistrationConfig>,

    #[serde(default)]
    pub suffixes: Vec<SuffixConfig>,
}

fn default_install_dir() -> PathBuf {
    constants::DEFAULT_INSTALL_DIR.into()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Credentials {
    /// Directory Service Manager password.
    pub admin_password: String,

    /// DSCC agent password; falls back to the admin password.
    #[serde(default)]
    pub agent_password: Option<String>,

    /// Certificate database password, when instances carry a cert store.
    #[serde(default)]
    pub cert_password: Option<String>,
}

impl Credentials {
    pub fn admin(&self) -> Secret {
        Secret::new("admin", self.admin_password.as_str())
    }

    pub fn agent(&self) -> Secret {
        let value = self
            .agent_password
            .as_deref()
            .unwrap_or(self.admin_password.as_str());
        Secret::new("agent", value)
    }

    pub fn cert(&self) -> Option<Secret> {
        self.cert_password
            .as_deref()
            .map(|value| Secret::new("cert", value))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstanceConfig {
    /// Full path of the Directory Server instance.
    pub path: PathBuf,

    /// Create inside this existing (empty) directory.
    #[serde(default)]
    pub below: Option<PathBuf>,

    /// Never prompt; always on unless a manifest says otherwise.
    #[serde(default = "default_true")]
    pub no_inter: bool,

    #[serde(default)]
    pub user_name: Option<String>,

    #[serde(default)]
    pub group_name: Option<String>,

    #[serde(default)]
    pub hostname: Option<String>,

    #[serde(default)]
    pub ldap_port: Option<u16>,

    #[serde(default)]
    pub ldaps_port: Option<u16>,

    /// Directory Manager DN; the tool defaults to cn=Directory Manager.
    #[serde(default)]
    pub dn: Option<String>,

    /// Start with the last known-good configuration.
    #[serde(default)]
    pub safe_mode: bool,

    /// Push manually modified schema to consumers on start.
    #[serde(default)]
    pub schema_push: bool,

    /// Forcible shutdown on stop.
    #[serde(default)]
    pub force: bool,

    /// Whether sync should also bring the instance up.
    #[serde(default = "default_true")]
    pub start: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Full path of the DSCC agent instance.
    pub path: PathBuf,

    #[serde(default = "default_true")]
    pub no_inter: bool,

    /// Agent port; the tool defaults to 3997.
    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default = "default_true")]
    pub start: bool,

    /// Present when the agent should also serve SNMP.
    #[serde(default)]
    pub snmp: Option<SnmpConfig>,

    /// Register the agent as an OS service during sync.
    #[serde(default)]
    pub register_service: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnmpConfig {
    #[serde(default)]
    pub v3: bool,

    #[serde(default)]
    pub snmp_port: Option<u16>,

    #[serde(default)]
    pub ds_port: Option<u16>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistrationConfig {
    /// Which registry section the entry belongs to.
    pub kind: RegistryKind,

    /// Installation path of the registered instance.
    pub path: PathBuf,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub hostname: Option<String>,

    /// Agent port used to reach a registered server.
    #[serde(default)]
    pub agent_port: Option<u16>,

    /// Bind DN; the tool defaults to cn=Directory Manager.
    #[serde(default)]
    pub dn: Option<String>,

    /// Force removal even when the agent is unreachable.
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuffixConfig {
    /// Suffix DN, e.g. dc=example,dc=com.
    pub dn: String,

    #[serde(default)]
    pub hostname: Option<String>,

    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub db_name: Option<String>,

    #[serde(default)]
    pub db_path: Option<PathBuf>,

    /// Accept non-trusted server certificates without confirmation.
    #[serde(default)]
    pub accept_cert: bool,

    /// Do not create the top entry for the new suffix.
    #[serde(default)]
    pub no_top_entry: bool,

    /// LDIF file (optionally gzipped) to populate the suffix with.
    #[serde(default)]
    pub ldif_file: Option<PathBuf>,

    /// Leave entries under this DN out of the import.
    #[serde(default)]
    pub exclude_dn: Option<String>,

    /// Append to existing entries instead of replacing them.
    #[serde(default)]
    pub incremental: bool,

    /// Launch the import as a background task.
    #[serde(default, rename = "async")]
    pub async_import: bool,

    /// Raw `-f`-style import options, passed through verbatim.
    #[serde(default)]
    pub import_opts: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetupConfig {
    /// Registry LDAP port; the tool defaults to 3998.
    #[serde(default)]
    pub ldap_port: Option<u16>,

    /// Registry LDAPS port; the tool defaults to 3999.
    #[serde(default)]
    pub ldaps_port: Option<u16>,

    #[serde(default = "default_true")]
    pub no_inter: bool,
}
