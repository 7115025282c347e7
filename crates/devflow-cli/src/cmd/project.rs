use anyhow::Context as _;
use clap::Subcommand;
use devflow_core::task;

use super::Context;
use crate::output::{print_json, print_table, truncate};

#[derive(Subcommand)]
pub enum ProjectSubcommand {
    /// List projects, newest first
    List,

    /// Create a project and select it
    Create {
        name: String,
        #[arg(long, short = 'd')]
        description: String,
    },

    /// Show a project (default: the selected one)
    Show { id: Option<String> },

    /// Select the project later commands work on
    Select { id: String },

    /// Dashboard statistics for a project
    Stats { id: Option<String> },
}

pub fn run(ctx: &Context, subcmd: ProjectSubcommand) -> anyhow::Result<()> {
    match subcmd {
        ProjectSubcommand::List => list(ctx),
        ProjectSubcommand::Create { name, description } => create(ctx, &name, &description),
        ProjectSubcommand::Show { id } => show(ctx, id.as_deref()),
        ProjectSubcommand::Select { id } => select(ctx, &id),
        ProjectSubcommand::Stats { id } => stats(ctx, id.as_deref()),
    }
}

fn list(ctx: &Context) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let projects = store.list_projects(&ctx.user)?;
    let selected = store.selected_project_id(&ctx.user)?;

    if ctx.json {
        return print_json(&projects);
    }
    if projects.is_empty() {
        println!("No projects. Create one with `devflow project create <name> -d <description>`.");
        return Ok(());
    }
    let rows = projects
        .iter()
        .map(|p| {
            let marker = if selected.as_deref() == Some(p.id.as_str()) { "*" } else { "" };
            vec![
                marker.to_string(),
                p.id.clone(),
                p.name.clone(),
                task::summarize(&p.tasks),
                p.created_at.format("%Y-%m-%d %H:%M").to_string(),
            ]
        })
        .collect();
    print_table(&["", "ID", "NAME", "TASKS", "CREATED"], rows);
    Ok(())
}

fn create(ctx: &Context, name: &str, description: &str) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let project = store
        .create_project(&ctx.user, name, description)
        .context("failed to create project")?;
    store.select_project(&ctx.user, Some(&project.id))?;

    if ctx.json {
        return print_json(&project);
    }
    println!("Created project [{}]: {}", project.id, project.name);
    Ok(())
}

fn show(ctx: &Context, id: Option<&str>) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let project = ctx.project(&store, id)?;

    if ctx.json {
        return print_json(&project);
    }
    println!("{} [{}]", project.name, project.id);
    println!("{}", project.description);
    println!();
    println!("Tasks:    {}", task::summarize(&project.tasks));
    println!("Files:    {}", project.generated_code.len());
    println!("Messages: {}", project.messages.len());
    if let Some(last) = project.messages.last() {
        println!("Last:     {}: {}", last.sender, truncate(&last.text, 60));
    }
    Ok(())
}

fn select(ctx: &Context, id: &str) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let project = store
        .get_project(&ctx.user, id)
        .with_context(|| format!("project '{id}' not found"))?;
    store.select_project(&ctx.user, Some(id))?;

    if ctx.json {
        return print_json(&serde_json::json!({ "selected": project.id }));
    }
    println!("Selected [{}]: {}", project.id, project.name);
    Ok(())
}

fn stats(ctx: &Context, id: Option<&str>) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let project = ctx.project(&store, id)?;
    let stats = task::stats(&project);

    if ctx.json {
        return print_json(&stats);
    }
    println!("Tasks:      {} total", stats.total_tasks);
    println!("  pending:     {}", stats.pending);
    println!("  in-progress: {}", stats.in_progress);
    println!("  done:        {}", stats.done);
    println!("Completion: {}%", stats.completion_percent);
    println!("Files:      {}", stats.generated_files);
    println!("Messages:   {}", stats.chat_messages);
    if !stats.heatmap.is_empty() {
        println!();
        let rows = stats
            .heatmap
            .iter()
            .map(|c| {
                vec![
                    truncate(&c.title, 40),
                    c.files.to_string(),
                    "█".repeat(c.level as usize),
                ]
            })
            .collect();
        print_table(&["TASK", "FILES", "HEAT"], rows);
    }
    Ok(())
}
