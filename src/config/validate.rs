//! Pre-flight checks on the manifest. Everything here fails before any
//! external command runs.

use crate::config::types::Manifest;
use crate::error::{DseectlError, Result};
use std::path::Path;

pub fn validate(manifest: &Manifest) -> Result<()> {
    if let Some(setup) = &manifest.registry {
        check_port("registry.ldap_port", setup.ldap_port)?;
        check_port("registry.ldaps_port", setup.ldaps_port)?;
    }

    for inst in &manifest.instances {
        require_absolute("instance path", &inst.path)?;
        check_port("ldap_port", inst.ldap_port)?;
        check_port("ldaps_port", inst.ldaps_port)?;
        check_hostname(inst.hostname.as_deref())?;
        if let Some(below) = &inst.below {
            require_absolute("instance below", below)?;
        }
    }

    for agent in &manifest.agents {
        require_absolute("agent path", &agent.path)?;
        check_port("agent port", agent.port)?;
        if let Some(snmp) = &agent.snmp {
            check_port("snmp_port", snmp.snmp_port)?;
            check_port("ds_port", snmp.ds_port)?;
        }
    }

    for reg in &manifest.registrations {
        require_absolute("registration path", &reg.path)?;
        check_port("agent_port", reg.agent_port)?;
        check_hostname(reg.hostname.as_deref())?;
    }

    for suffix in &manifest.suffixes {
        if !suffix.dn.contains('=') {
            return Err(DseectlError::Validation(format!(
                "'{}' is not a suffix DN",
                suffix.dn
            )));
        }
        check_port("suffix port", suffix.port)?;
        check_hostname(suffix.hostname.as_deref())?;
        if let Some(ldif) = &suffix.ldif_file
            && !ldif.is_file()
        {
            return Err(DseectlError::Validation(format!(
                "ldif_file {} does not exist",
                ldif.display()
            )));
        }
    }

    Ok(())
}

fn check_port(name: &str, port: Option<u16>) -> Result<()> {
    if port == Some(0) {
        return Err(DseectlError::Validation(format!("{} must not be 0", name)));
    }
    Ok(())
}

fn require_absolute(name: &str, path: &Path) -> Result<()> {
    if !path.is_absolute() {
        return Err(DseectlError::Validation(format!(
            "{} '{}' must be absolute",
            name,
            path.display()
        )));
    }
    Ok(())
}

fn check_hostname(hostname: Option<&str>) -> Result<()> {
    if let Some(host) = hostname
        && (host.is_empty() || host.chars().any(char::is_whitespace))
    {
        return Err(DseectlError::Validation(format!(
            "'{}' is not a valid hostname",
            host
        )));
    }
    Ok(())
}
