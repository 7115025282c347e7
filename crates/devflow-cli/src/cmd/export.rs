use anyhow::Context as _;
use devflow_core::{export, io};
use std::path::{Path, PathBuf};

use super::Context;
use crate::output::print_json;

pub fn run(ctx: &Context, project: Option<&str>, out: Option<&Path>) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let project = ctx.project(&store, project)?;
    if project.generated_code.is_empty() {
        anyhow::bail!("project '{}' has no generated code to export", project.name);
    }

    let bytes = export::zip_files(&project.generated_code).context("failed to build archive")?;
    let path: PathBuf = match out {
        Some(p) => p.to_path_buf(),
        None => PathBuf::from(export::archive_name(&project.name)),
    };
    io::atomic_write(&path, &bytes).with_context(|| format!("failed to write {}", path.display()))?;

    if ctx.json {
        return print_json(&serde_json::json!({
            "path": path,
            "files": project.generated_code.len(),
            "bytes": bytes.len(),
        }));
    }
    println!(
        "Exported {} files to {}",
        project.generated_code.len(),
        path.display()
    );
    Ok(())
}
