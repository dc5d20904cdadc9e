use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "dseectl",
    version,
    about = "Declarative lifecycle management for DSEE directory servers"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args)]
pub struct GlobalArgs {
    /// Suppress informational output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Show executed vendor commands
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Converge every entity in the manifest toward its desired state
    Sync(ManifestArgs),

    /// Tear manifest entities down (unregister, stop, delete)
    Destroy(ManifestArgs),

    /// Probe current state without changing anything
    Status(StatusArgs),

    /// List DSCC registry entries
    Registry(RegistryArgs),

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct ManifestArgs {
    /// Manifest file describing the desired state
    #[arg(long, short)]
    pub config: PathBuf,
}

#[derive(Args)]
pub struct StatusArgs {
    /// Manifest file describing the desired state
    #[arg(long, short)]
    pub config: PathBuf,

    /// Machine-readable output
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct RegistryArgs {
    /// Registry section to list: agents or servers
    pub kind: String,

    /// Manifest file describing the desired state
    #[arg(long, short)]
    pub config: PathBuf,

    /// Machine-readable output
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn sync_parses_config_flag() {
        let cli = Cli::parse_from(["dseectl", "sync", "--config", "/etc/dseectl.yml"]);
        match cli.command {
            Commands::Sync(args) => {
                assert_eq!(args.config, PathBuf::from("/etc/dseectl.yml"));
            }
            _ => panic!("expected sync"),
        }
    }
}
