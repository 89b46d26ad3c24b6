//! Continuum hub binary
//!
//! Relays type pushes and focus requests between the sessions of each
//! project.
//!
//! # Usage
//!
//! ```bash
//! continuum-hub
//! continuum-hub --port 9850 --host 0.0.0.0
//! ```

use clap::Parser;

use continuum::config::ContinuumConfig;

/// Continuum sync hub
#[derive(Parser, Debug)]
#[command(name = "continuum-hub")]
#[command(about = "Relay daemon for continuum sessions", version)]
struct Args {
    /// Port to listen on (default: hub.port from the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Host to bind to (default: hub.host from the config file)
    #[arg(long)]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ContinuumConfig::load()?;
    continuum::init_tracing(&config.logging.level);

    let args = Args::parse();
    let host = args.host.unwrap_or(config.hub.host);
    let port = args.port.unwrap_or(config.hub.port);

    continuum::hub::run(&host, port).await
}
