//! Files command handler - List member files of the enclosing project

use crate::cli::{FilesArgs, OutputFormat};
use crate::commands::{display, enclosing_root, CommandContext};
use std::path::Path;

use crate::error::Result;
use crate::index::{SymbolIndex, TypeIndex, INDEX_FILE_NAME};
use crate::project::{database_path_for, descriptor, FileDiscovery, FilePatterns};

/// Index source tag used when the CLI only reads the index
const CLI_SOURCE: &str = "continuum-cli";

/// Run the files command
pub fn run_files(args: &FilesArgs, ctx: &CommandContext) -> Result<String> {
    let root = enclosing_root(args.path.as_ref())?;
    let config = descriptor::load(&root)?;
    let discovery = FileDiscovery::new(&root, FilePatterns::parse(config.file_patterns()))?;
    let format = ctx.config.database.format;

    if ctx.verbose {
        eprintln!("project: {} ({})", root.display(), discovery.patterns());
    }

    match ctx.format {
        OutputFormat::Json => {
            let files: Vec<serde_json::Value> = discovery
                .iter()
                .map(|path| {
                    serde_json::json!({
                        "path": display(&path),
                        "relative": display(path.strip_prefix(&root).unwrap_or(&path)),
                        "database": display(&database_path_for(&path, format)),
                    })
                })
                .collect();
            ctx.json(&serde_json::json!({
                "_type": "project_files",
                "root": display(&root),
                "patterns": discovery.patterns().to_string(),
                "count": files.len(),
                "files": files,
                "index": index_summary(&root)?,
            }))
        }
        OutputFormat::Text => {
            let mut output = String::new();
            for path in &discovery {
                let shown = if args.relative {
                    path.strip_prefix(&root).unwrap_or(&path).to_path_buf()
                } else {
                    path.clone()
                };
                if args.databases {
                    output.push_str(&format!(
                        "{}\t{}\n",
                        shown.display(),
                        database_path_for(&path, format).display()
                    ));
                } else {
                    output.push_str(&format!("{}\n", shown.display()));
                }
            }
            Ok(output)
        }
    }
}

/// Per-source summary of the shared type index, empty before any session
/// has written one
fn index_summary(root: &Path) -> Result<Vec<serde_json::Value>> {
    let path = descriptor::meta_dir(root).join(INDEX_FILE_NAME);
    if !path.is_file() {
        return Ok(Vec::new());
    }

    let index = TypeIndex::open(&path, CLI_SOURCE)?;
    let mut summary = Vec::new();
    for source in index.sources()? {
        summary.push(serde_json::json!({
            "source": source,
            "types": index.types_from(&source)?.len(),
            "last_updated": index.last_updated(&source)?.map(|t| t.to_rfc3339()),
        }));
    }
    Ok(summary)
}
