pub mod cli;
pub mod commands;
pub mod config;
pub mod constants;
pub mod error;
pub mod exec;
pub mod parse;
pub mod probe;
pub mod reconcile;
pub mod registry;
pub mod secrets;
pub mod ui;

use clap::Parser;
use std::process::exit;

/// Run dseectl CLI entrypoint.
pub fn run_cli() {
    // 0. Initialize color settings (must be first)
    ui::init_colors();

    // 1. Signal handling (mark cancellation; the sync loop checks the
    //    flag between entities so a vendor command is never killed
    //    mid-write)
    ctrlc::set_handler(move || {
        eprintln!();
        ui::mark_interrupted();
        ui::warning("Operation cancelled by user.");
    })
    .expect("Error setting Ctrl-C handler");

    // 2. Parse & run
    let args = cli::args::Cli::parse();
    ui::set_quiet(args.global.quiet);
    ui::set_verbose(args.global.verbose);

    if let Err(e) = cli::dispatcher::dispatch(&args) {
        ui::error(&format!("{}", e));
        exit(1);
    }
}
