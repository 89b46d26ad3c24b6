//! Hub command handler - Run the sync hub in the foreground

use crate::cli::HubArgs;
use crate::commands::CommandContext;
use crate::error::{ContinuumError, Result};

/// Run the hub command. Only returns on failure.
pub fn run_hub(args: &HubArgs, ctx: &CommandContext) -> Result<String> {
    let host = args.host.clone().unwrap_or_else(|| ctx.config.hub.host.clone());
    let port = args.port.unwrap_or(ctx.config.hub.port);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime
        .block_on(crate::hub::run(&host, port))
        .map_err(|e| ContinuumError::Transport {
            message: e.to_string(),
        })?;
    Ok(String::new())
}
