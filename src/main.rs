//! continuum CLI entry point

use std::process::ExitCode;

use clap::Parser;

use continuum::cli::{Cli, Commands};
use continuum::commands::{run_db_path, run_files, run_hub, run_init, run_root, CommandContext};
use continuum::config::ContinuumConfig;

fn main() -> ExitCode {
    match run() {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

fn run() -> continuum::Result<String> {
    let cli = Cli::parse();
    let config = ContinuumConfig::load()?;

    let level = if cli.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    continuum::init_tracing(level);

    let ctx = CommandContext::from_cli(cli.format, cli.verbose, config.clone());
    match &cli.command {
        Commands::Init(args) => run_init(args, &ctx),
        Commands::Files(args) => run_files(args, &ctx),
        Commands::Root(args) => run_root(args, &ctx),
        Commands::DbPath(args) => run_db_path(args, &ctx),
        Commands::Hub(args) => run_hub(args, &ctx),
    }
}
