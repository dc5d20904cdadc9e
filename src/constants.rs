//! Vendor defaults. Port numbers and paths mirror the stock DSEE 7
//! deployment layout.

/// Path under which the vendor software is installed.
pub const DEFAULT_INSTALL_DIR: &str = "/opt";

/// Product directory below the install root that holds the tool binaries.
pub const PRODUCT_DIR: &str = "dsee7";

/// System directories searched before the product bin directories.
pub const SYSTEM_BIN_DIRS: &[&str] = &["/bin", "/usr/bin", "/sbin", "/usr/sbin"];

/// DSCC registry LDAP / LDAPS ports.
pub const REGISTRY_LDAP_PORT: u16 = 3998;
pub const REGISTRY_LDAPS_PORT: u16 = 3999;

/// DSCC agent port.
pub const AGENT_PORT: u16 = 3997;

/// SNMP traffic and server-to-agent ports.
pub const SNMP_PORT: u16 = 3996;
pub const DS_PORT: u16 = 3995;

/// Marker emitted by `dsccsetup status` once the registry exists.
pub const ADS_CREATED_MARKER: &str = "DSCC Registry has been created";

/// Exit codes the `info` subcommands may legitimately return for an
/// instance that does not exist or is stopped.
pub const INFO_EXIT_CODES: &[i32] = &[0, 125, 154];

/// Wall-clock bound on a single vendor tool run.
pub const COMMAND_TIMEOUT_SECS: u64 = 300;

/// Tool-missing retry budget.
pub const RETRY_ATTEMPTS: u32 = 4;

/// Name of the advisory lock file serializing vendor tool runs across
/// processes.
pub const LOCK_FILE_NAME: &str = "dseectl.lock";
