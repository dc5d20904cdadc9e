use crate::cli::args::{Cli, Commands};
use crate::commands;
use crate::error::Result;

pub fn dispatch(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Sync(args) => commands::sync::run(args),
        Commands::Destroy(args) => commands::destroy::run(args),
        Commands::Status(args) => commands::status::run(args),
        Commands::Registry(args) => commands::registry::run(args),
        Commands::Completions { shell } => {
            commands::completions::run(*shell);
            Ok(())
        }
    }
}
