//! Root command handler - Locate the enclosing project

use crate::cli::{OutputFormat, RootArgs};
use crate::commands::{display, enclosing_root, CommandContext};
use crate::error::Result;

/// Run the root command
pub fn run_root(args: &RootArgs, ctx: &CommandContext) -> Result<String> {
    let root = enclosing_root(args.path.as_ref())?;

    match ctx.format {
        OutputFormat::Json => ctx.json(&serde_json::json!({
            "_type": "project_root",
            "root": display(&root),
        })),
        OutputFormat::Text => Ok(format!("{}\n", root.display())),
    }
}
