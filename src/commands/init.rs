//! Init command handler - Turn a directory into a project

use crate::cli::{InitArgs, OutputFormat};
use crate::commands::{display, CommandContext};
use crate::error::Result;
use crate::paths::{canonicalize_path, resolve_pathbuf};
use crate::project::{descriptor, AnalysisLauncher, AnalysisPass, FileDiscovery, FilePatterns};

/// Run the init command
pub fn run_init(args: &InitArgs, ctx: &CommandContext) -> Result<String> {
    let root = canonicalize_path(&resolve_pathbuf(Some(&args.root))?);
    let discovery = FileDiscovery::new(&root, FilePatterns::parse(&args.patterns))?;
    descriptor::create(&root, &args.patterns)?;

    let members: Vec<_> = discovery.iter().collect();
    let pass = if args.analyze {
        AnalysisLauncher::new(ctx.config.analysis.clone(), ctx.config.database.format)
            .launch(&members)
    } else {
        AnalysisPass::default()
    };

    match ctx.format {
        OutputFormat::Json => ctx.json(&serde_json::json!({
            "_type": "project_created",
            "root": display(&root),
            "patterns": discovery.patterns().to_string(),
            "members": members.len(),
            "analysis": {
                "launched": pass.jobs.iter().map(|j| display(&j.binary)).collect::<Vec<_>>(),
                "skipped": pass.skipped.iter().map(|p| display(p)).collect::<Vec<_>>(),
                "failed": pass.failed.iter().map(|p| display(p)).collect::<Vec<_>>(),
            },
        })),
        OutputFormat::Text => {
            let mut output = format!(
                "Created project at {} ({} member files)\n",
                root.display(),
                members.len()
            );
            if args.analyze {
                output.push_str(&format!(
                    "Analysis: {} launched, {} skipped, {} failed\n",
                    pass.jobs.len(),
                    pass.skipped.len(),
                    pass.failed.len()
                ));
            }
            if ctx.verbose {
                for member in &members {
                    output.push_str(&format!("  {}\n", member.display()));
                }
            }
            Ok(output)
        }
    }
}
