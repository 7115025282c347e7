use anyhow::Context as _;
use clap::Subcommand;
use devflow_core::task;
use devflow_core::types::TaskStatus;

use super::{block_on, Context};
use crate::output::{print_json, print_table, truncate};

#[derive(Subcommand)]
pub enum TaskSubcommand {
    /// Show the board
    List {
        #[arg(long)]
        project: Option<String>,
    },
    /// Move a task to pending, in-progress or done
    Move {
        task_id: String,
        status: String,
        #[arg(long)]
        project: Option<String>,
    },
    /// Delete a task
    Delete {
        task_id: String,
        #[arg(long)]
        project: Option<String>,
    },
    /// Generate tasks from the project description and append them
    Decompose {
        #[arg(long)]
        project: Option<String>,
        /// Decompose this text instead of the project description
        #[arg(long)]
        description: Option<String>,
    },
    /// Generate one of a task's files and store it
    Boilerplate {
        task_id: String,
        file: String,
        #[arg(long)]
        project: Option<String>,
    },
}

pub fn run(ctx: &Context, subcmd: TaskSubcommand) -> anyhow::Result<()> {
    match subcmd {
        TaskSubcommand::List { project } => list(ctx, project.as_deref()),
        TaskSubcommand::Move {
            task_id,
            status,
            project,
        } => move_task(ctx, project.as_deref(), &task_id, &status),
        TaskSubcommand::Delete { task_id, project } => delete(ctx, project.as_deref(), &task_id),
        TaskSubcommand::Decompose {
            project,
            description,
        } => decompose(ctx, project.as_deref(), description.as_deref()),
        TaskSubcommand::Boilerplate {
            task_id,
            file,
            project,
        } => boilerplate(ctx, project.as_deref(), &task_id, &file),
    }
}

fn list(ctx: &Context, project: Option<&str>) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let project = ctx.project(&store, project)?;
    let columns = task::board(&project.tasks);

    if ctx.json {
        return print_json(&columns);
    }
    if project.tasks.is_empty() {
        println!("No tasks. Run `devflow task decompose` to generate some.");
        return Ok(());
    }
    for column in columns {
        println!("{} ({})", column.title, column.tasks.len());
        for t in column.tasks {
            println!("  [{}] {}", t.id, truncate(&t.title, 60));
        }
    }
    Ok(())
}

fn move_task(ctx: &Context, project: Option<&str>, task_id: &str, status: &str) -> anyhow::Result<()> {
    let status: TaskStatus = status.parse()?;
    let store = ctx.store()?;
    let project = ctx.project(&store, project)?;
    let (_, changed) = store
        .modify_project(&ctx.user, &project.id, |p| {
            task::move_task(&mut p.tasks, task_id, status)
        })
        .with_context(|| format!("failed to move task '{task_id}'"))?;

    if ctx.json {
        return print_json(&serde_json::json!({
            "task_id": task_id,
            "status": status,
            "changed": changed,
        }));
    }
    if changed {
        println!("Moved task [{task_id}] to {status}");
    } else {
        println!("Task [{task_id}] is already {status}");
    }
    Ok(())
}

fn delete(ctx: &Context, project: Option<&str>, task_id: &str) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let project = ctx.project(&store, project)?;
    store
        .modify_project(&ctx.user, &project.id, |p| {
            task::delete_task(&mut p.tasks, task_id)?;
            Ok(true)
        })
        .with_context(|| format!("failed to delete task '{task_id}'"))?;

    if ctx.json {
        return print_json(&serde_json::json!({ "deleted": task_id }));
    }
    println!("Deleted task [{task_id}]");
    Ok(())
}

fn decompose(ctx: &Context, project: Option<&str>, description: Option<&str>) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let project = ctx.project(&store, project)?;
    let generator = ctx.generator()?;
    let input = description.unwrap_or(&project.description).to_string();

    let generated = block_on(devflow_ai::tools::generate_tasks(&generator, &input))??;
    let appended = generated.clone();
    store.modify_project(&ctx.user, &project.id, move |p| {
        let any = !appended.is_empty();
        task::append_tasks(&mut p.tasks, appended);
        Ok(any)
    })?;

    if ctx.json {
        return print_json(&generated);
    }
    let rows = generated
        .iter()
        .map(|t| vec![t.id.clone(), truncate(&t.title, 50), t.files.join(", ")])
        .collect();
    print_table(&["ID", "TITLE", "FILES"], rows);
    Ok(())
}

fn boilerplate(ctx: &Context, project: Option<&str>, task_id: &str, file: &str) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let project = ctx.project(&store, project)?;
    let t = task::find(&project.tasks, task_id)?;
    if !t.files.iter().any(|f| f == file) {
        anyhow::bail!("task '{task_id}' does not list file '{file}'");
    }
    let generator = ctx.generator()?;

    let content =
        block_on(devflow_ai::tools::generate_boilerplate(&generator, &t.description, file))??;
    let stored = content.clone();
    store.modify_project(&ctx.user, &project.id, |p| {
        devflow_core::code::upsert(&mut p.generated_code, file, stored);
        Ok(true)
    })?;

    if ctx.json {
        return print_json(&serde_json::json!({ "path": file, "content": content }));
    }
    println!("{content}");
    Ok(())
}
