//! CLI argument definitions using clap with subcommand architecture

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::DatabaseFormat;

/// Multi-binary project model and type sync for analysis sessions
#[derive(Parser, Debug)]
#[command(name = "continuum")]
#[command(about = "Manage continuum projects and run the sync hub")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (applies to all commands)
    #[arg(short, long, default_value = "text", value_enum, global = true)]
    pub format: OutputFormat,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available subcommands for continuum
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Turn a directory into a project
    Init(InitArgs),

    /// List the member files of the enclosing project
    #[command(visible_alias = "ls")]
    Files(FilesArgs),

    /// Print the root of the enclosing project
    Root(RootArgs),

    /// Print the analysis database path of a binary
    DbPath(DbPathArgs),

    /// Run the sync hub in the foreground
    Hub(HubArgs),
}

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to turn into a project
    pub root: PathBuf,

    /// Semicolon-separated file name patterns, e.g. "*.exe;*.dll"
    #[arg(short, long)]
    pub patterns: String,

    /// Start the headless analyzer for every member file
    #[arg(long)]
    pub analyze: bool,
}

/// Arguments for the files command
#[derive(Args, Debug)]
pub struct FilesArgs {
    /// Any path inside the project (default: current directory)
    pub path: Option<PathBuf>,

    /// Print paths relative to the project root
    #[arg(short, long)]
    pub relative: bool,

    /// Also print each member's database path
    #[arg(long)]
    pub databases: bool,
}

/// Arguments for the root command
#[derive(Args, Debug)]
pub struct RootArgs {
    /// Any path inside the project (default: current directory)
    pub path: Option<PathBuf>,
}

/// Arguments for the db-path command
#[derive(Args, Debug)]
pub struct DbPathArgs {
    /// Binary to map
    pub binary: PathBuf,

    /// Database flavour (default: database.format from the config file)
    #[arg(long, value_enum)]
    pub database_format: Option<DatabaseFormat>,
}

/// Arguments for the hub command
#[derive(Args, Debug)]
pub struct HubArgs {
    /// Port to listen on (default: hub.port from the config file)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Host to bind to (default: hub.host from the config file)
    #[arg(long)]
    pub host: Option<String>,
}

/// Output format for results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text (default for terminal)
    #[default]
    Text,
    /// JSON - standard JSON output for machine parsing
    Json,
}
