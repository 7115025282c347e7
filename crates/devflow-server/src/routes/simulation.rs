use axum::extract::{Path, State};
use axum::{Extension, Json};
use devflow_core::action::ActionKey;
use devflow_core::code::GeneratedCode;
use devflow_core::simulation::SimulationResult;
use serde::Deserialize;

use super::{load_project, modify_project};
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SimulationBody {
    pub goal: String,
}

/// POST /api/projects/{id}/simulation: run a multi-agent simulation. The
/// result is held until it is approved or discarded.
pub async fn run_simulation(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(body): Json<SimulationBody>,
) -> Result<Json<SimulationResult>, AppError> {
    if body.goal.trim().is_empty() {
        return Err(AppError::bad_request("goal must not be empty"));
    }
    let project = load_project(&app, &user.id, &id).await?;
    let guard = app
        .actions
        .start(ActionKey::new(&user.id, "simulation", &id))?;
    let result = guard.finish(
        devflow_ai::tools::run_agent_simulation(
            app.generator.as_ref(),
            &body.goal,
            &project.generated_code,
        )
        .await,
    )?;
    tracing::info!(
        project_id = %id,
        turns = result.turns.len(),
        files = result.files.len(),
        "simulation finished"
    );
    app.simulations()
        .insert((user.id.clone(), id), result.clone());
    Ok(Json(result))
}

/// GET /api/projects/{id}/simulation: the pending result.
pub async fn get_simulation(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<SimulationResult>, AppError> {
    app.simulations()
        .get(&(user.id, id))
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::not_found("no pending simulation"))
}

/// DELETE /api/projects/{id}/simulation: discard the pending result.
pub async fn discard_simulation(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Json<serde_json::Value> {
    let discarded = app.simulations().remove(&(user.id, id)).is_some();
    Json(serde_json::json!({ "discarded": discarded }))
}

/// POST /api/projects/{id}/simulation/approve: apply the simulated file set
/// to the project's code, overriding by path.
pub async fn approve_simulation(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<Vec<GeneratedCode>>, AppError> {
    let scope = (user.id.clone(), id.clone());
    let pending = app
        .simulations()
        .remove(&scope)
        .ok_or_else(|| AppError::not_found("no pending simulation"))?;

    let project = modify_project(&app, &user.id, &id, move |p| {
        pending.approve_into(&mut p.generated_code);
        Ok(true)
    })
    .await?;
    tracing::info!(project_id = %id, "simulation approved");
    Ok(Json(project.generated_code))
}
