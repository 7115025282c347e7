use anyhow::Context as _;
use devflow_core::io;
use devflow_core::preview::{self, PreviewOptions, ResourceRegistry};
use std::path::Path;

use super::Context;
use crate::output::print_json;

/// Build the preview in a throwaway registry and print the entry document.
/// Resource addresses in the output resolve only on a running server.
pub fn run(ctx: &Context, project: Option<&str>, out: Option<&Path>) -> anyhow::Result<()> {
    let config = ctx.config()?;
    let store = ctx.store()?;
    let project = ctx.project(&store, project)?;

    let registry = ResourceRegistry::new(config.preview.resource_prefix.clone());
    let deployment = preview::deploy(
        &project.generated_code,
        &registry,
        &PreviewOptions::from(&config.preview),
    )?;
    let document = deployment.main_document().unwrap_or_default();

    if let Some(path) = out {
        io::atomic_write(path, document.as_bytes())
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    if ctx.json {
        return print_json(&serde_json::json!({
            "deployment": deployment.info(),
            "document": document,
        }));
    }
    match out {
        Some(path) => println!(
            "Wrote {} (entry {}, {} assets)",
            path.display(),
            deployment.entry_path(),
            deployment.asset_addresses().len()
        ),
        None => println!("{document}"),
    }
    Ok(())
}
