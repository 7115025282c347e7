use anyhow::Context as _;
use clap::Subcommand;
use devflow_core::code::{self, FileTreeNode, GeneratedCode};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::PathBuf;

use super::Context;
use crate::output::{print_json, print_table};

#[derive(Subcommand)]
pub enum CodeSubcommand {
    /// List generated files
    List {
        #[arg(long)]
        project: Option<String>,
    },
    /// Show generated files as a directory tree
    Tree {
        #[arg(long)]
        project: Option<String>,
    },
    /// Print one generated file
    Show {
        path: String,
        #[arg(long)]
        project: Option<String>,
    },
    /// Store a file in the project, replacing any file at the same path
    Put {
        path: String,
        /// Read content from this file (default: stdin)
        #[arg(long)]
        from: Option<PathBuf>,
        #[arg(long)]
        project: Option<String>,
    },
}

pub fn run(ctx: &Context, subcmd: CodeSubcommand) -> anyhow::Result<()> {
    match subcmd {
        CodeSubcommand::List { project } => list(ctx, project.as_deref()),
        CodeSubcommand::Tree { project } => tree(ctx, project.as_deref()),
        CodeSubcommand::Show { path, project } => show(ctx, project.as_deref(), &path),
        CodeSubcommand::Put {
            path,
            from,
            project,
        } => put(ctx, project.as_deref(), &path, from),
    }
}

fn list(ctx: &Context, project: Option<&str>) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let project = ctx.project(&store, project)?;

    if ctx.json {
        return print_json(&project.generated_code);
    }
    let rows = project
        .generated_code
        .iter()
        .map(|f| vec![f.path.clone(), f.content.lines().count().to_string()])
        .collect();
    print_table(&["PATH", "LINES"], rows);
    Ok(())
}

fn tree(ctx: &Context, project: Option<&str>) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let project = ctx.project(&store, project)?;
    let tree = code::file_tree(&project.generated_code);

    if ctx.json {
        return print_json(&tree);
    }
    print_tree(&tree, 0);
    Ok(())
}

fn print_tree(nodes: &BTreeMap<String, FileTreeNode>, depth: usize) {
    let indent = "  ".repeat(depth);
    for (name, node) in nodes {
        match node {
            FileTreeNode::Dir { children } => {
                println!("{indent}{name}/");
                print_tree(children, depth + 1);
            }
            FileTreeNode::File { .. } => println!("{indent}{name}"),
        }
    }
}

fn show(ctx: &Context, project: Option<&str>, path: &str) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let project = ctx.project(&store, project)?;
    let file = code::find(&project.generated_code, path)
        .ok_or_else(|| devflow_core::DevflowError::FileNotFound(path.to_string()))?;

    if ctx.json {
        return print_json(file);
    }
    print!("{}", file.content);
    if !file.content.ends_with('\n') {
        println!();
    }
    Ok(())
}

fn put(ctx: &Context, project: Option<&str>, path: &str, from: Option<PathBuf>) -> anyhow::Result<()> {
    if devflow_core::paths::normalize_file_path(path).is_empty() {
        anyhow::bail!("file path must not be empty");
    }
    let content = match from {
        Some(src) => std::fs::read_to_string(&src)
            .with_context(|| format!("failed to read {}", src.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };

    let store = ctx.store()?;
    let project = ctx.project(&store, project)?;
    let incoming = vec![GeneratedCode::new(path, content)];
    store.modify_project(&ctx.user, &project.id, |p| {
        code::merge(&mut p.generated_code, incoming);
        Ok(true)
    })?;

    if ctx.json {
        return print_json(&serde_json::json!({ "stored": path }));
    }
    println!("Stored {path}");
    Ok(())
}
