use devflow_core::simulation::SimulationResult;

use super::{block_on, Context};
use crate::output::{print_json, print_table};

/// Replace the project's code with a generated starter set.
pub fn scaffold(ctx: &Context, project: Option<&str>, description: Option<&str>) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let project = ctx.project(&store, project)?;
    let generator = ctx.generator()?;
    let input = description.unwrap_or(&project.description);

    let files = block_on(devflow_ai::tools::generate_project_scaffold(&generator, input))??;
    let replacement = files.clone();
    store.modify_project(&ctx.user, &project.id, |p| {
        p.generated_code = replacement;
        Ok(true)
    })?;

    if ctx.json {
        return print_json(&files);
    }
    println!("Scaffolded {} files:", files.len());
    for f in &files {
        println!("  {}", f.path);
    }
    Ok(())
}

pub fn architecture(ctx: &Context, project: Option<&str>) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let project = ctx.project(&store, project)?;
    let generator = ctx.generator()?;

    let diagram = block_on(devflow_ai::tools::generate_architecture_diagram(
        &generator, &project,
    ))??;

    if ctx.json {
        return print_json(&serde_json::json!({ "project_id": project.id, "diagram": diagram }));
    }
    println!("{diagram}");
    Ok(())
}

/// Run a simulation; with `approve`, apply its file set to the project.
pub fn simulate(ctx: &Context, project: Option<&str>, goal: &str, approve: bool) -> anyhow::Result<()> {
    if goal.trim().is_empty() {
        anyhow::bail!("goal must not be empty");
    }
    let store = ctx.store()?;
    let project = ctx.project(&store, project)?;
    let generator = ctx.generator()?;

    let result: SimulationResult = block_on(devflow_ai::tools::run_agent_simulation(
        &generator,
        goal,
        &project.generated_code,
    ))??;

    if approve {
        let pending = result.clone();
        store.modify_project(&ctx.user, &project.id, |p| {
            pending.approve_into(&mut p.generated_code);
            Ok(true)
        })?;
    }

    if ctx.json {
        return print_json(&serde_json::json!({ "result": result, "approved": approve }));
    }
    for turn in &result.turns {
        println!("[{}] {}", turn.agent, turn.message);
    }
    println!();
    let rows = result
        .files
        .iter()
        .map(|f| vec![f.path.clone(), f.content.lines().count().to_string()])
        .collect();
    print_table(&["PATH", "LINES"], rows);
    if approve {
        println!("\nApplied {} files to the project.", result.files.len());
    } else {
        println!("\nRe-run with --approve to apply these files.");
    }
    Ok(())
}
