use anyhow::Context as _;
use devflow_ai::Tool;
use std::io::Read;
use std::path::Path;

use super::{block_on, Context};
use crate::output::print_json;

pub fn run(
    ctx: &Context,
    name: &str,
    file: Option<&Path>,
    language: Option<&str>,
) -> anyhow::Result<()> {
    let tool: Tool = name.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let input = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };
    if input.trim().is_empty() {
        anyhow::bail!("no input: pass --file or pipe code on stdin");
    }

    let generator = ctx.generator()?;
    let output = block_on(devflow_ai::tools::run_tool(&generator, tool, &input, language))?
        .with_context(|| format!("{tool} failed"))?;

    if ctx.json {
        return print_json(&serde_json::json!({ "tool": tool.as_str(), "output": output }));
    }
    println!("{output}");
    Ok(())
}
