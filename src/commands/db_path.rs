//! DB-path command handler - Map a binary to its analysis database

use crate::cli::{DbPathArgs, OutputFormat};
use crate::commands::{display, CommandContext};
use crate::error::Result;
use crate::paths::resolve_pathbuf;
use crate::project::database_path_for;

/// Run the db-path command
pub fn run_db_path(args: &DbPathArgs, ctx: &CommandContext) -> Result<String> {
    let binary = resolve_pathbuf(Some(&args.binary))?;
    let format = args.database_format.unwrap_or(ctx.config.database.format);
    let database = database_path_for(&binary, format);

    match ctx.format {
        OutputFormat::Json => ctx.json(&serde_json::json!({
            "_type": "database_path",
            "binary": display(&binary),
            "database": display(&database),
        })),
        OutputFormat::Text => Ok(format!("{}\n", database.display())),
    }
}
