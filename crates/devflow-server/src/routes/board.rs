use axum::extract::{Path, State};
use axum::{Extension, Json};
use devflow_core::action::ActionKey;
use devflow_core::code;
use devflow_core::error::DevflowError;
use devflow_core::task::{self, Task};
use devflow_core::types::TaskStatus;
use serde::Deserialize;

use super::{load_project, modify_project};
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize, Default)]
pub struct DecomposeBody {
    /// Overrides the project description as the decomposition input.
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct StatusBody {
    pub status: String,
}

#[derive(Deserialize)]
pub struct BoilerplateBody {
    pub file: String,
}

/// GET /api/projects/{id}/board: tasks split into the three columns.
pub async fn get_board(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let project = load_project(&app, &user.id, &id).await?;
    let columns = task::board(&project.tasks);
    Ok(Json(serde_json::json!({
        "project_id": project.id,
        "columns": columns,
        "summary": task::summarize(&project.tasks),
    })))
}

/// POST /api/projects/{id}/tasks/decompose: generate tasks and append them.
pub async fn decompose(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(body): Json<DecomposeBody>,
) -> Result<Json<Vec<Task>>, AppError> {
    let project = load_project(&app, &user.id, &id).await?;
    let description = body
        .description
        .filter(|d| !d.trim().is_empty())
        .unwrap_or(project.description);

    let guard = app
        .actions
        .start(ActionKey::new(&user.id, "decompose", &id))?;
    let generated = guard.finish(
        devflow_ai::tools::generate_tasks(app.generator.as_ref(), &description).await,
    )?;
    tracing::info!(project_id = %id, count = generated.len(), "tasks generated");

    let appended = generated.clone();
    modify_project(&app, &user.id, &id, move |p| {
        let any = !appended.is_empty();
        task::append_tasks(&mut p.tasks, appended);
        Ok(any)
    })
    .await?;
    Ok(Json(generated))
}

/// PUT /api/projects/{id}/tasks/:task_id/status
pub async fn move_task(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path((id, task_id)): Path<(String, String)>,
    Json(body): Json<StatusBody>,
) -> Result<Json<Task>, AppError> {
    let status: TaskStatus = body.status.parse()?;
    let tid = task_id.clone();
    let project = modify_project(&app, &user.id, &id, move |p| {
        task::move_task(&mut p.tasks, &tid, status)
    })
    .await?;
    let moved = task::find(&project.tasks, &task_id)?.clone();
    Ok(Json(moved))
}

/// DELETE /api/projects/{id}/tasks/:task_id
pub async fn delete_task(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path((id, task_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, AppError> {
    let tid = task_id.clone();
    modify_project(&app, &user.id, &id, move |p| {
        task::delete_task(&mut p.tasks, &tid)?;
        Ok(true)
    })
    .await?;
    Ok(Json(serde_json::json!({ "deleted": task_id })))
}

/// POST /api/projects/{id}/tasks/:task_id/boilerplate: generate one of the
/// task's files and upsert it into the project's code.
pub async fn generate_boilerplate(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path((id, task_id)): Path<(String, String)>,
    Json(body): Json<BoilerplateBody>,
) -> Result<Json<code::GeneratedCode>, AppError> {
    let project = load_project(&app, &user.id, &id).await?;
    let task = task::find(&project.tasks, &task_id)?;
    if !task.files.iter().any(|f| f == &body.file) {
        return Err(DevflowError::FileNotFound(body.file).into());
    }

    let guard = app.actions.start(ActionKey::new(
        &user.id,
        "boilerplate",
        &format!("{id}/{task_id}/{}", body.file),
    ))?;
    let content = guard.finish(
        devflow_ai::tools::generate_boilerplate(
            app.generator.as_ref(),
            &task.description,
            &body.file,
        )
        .await,
    )?;

    let file = code::GeneratedCode::new(body.file.clone(), content.clone());
    modify_project(&app, &user.id, &id, move |p| {
        code::upsert(&mut p.generated_code, &body.file, content);
        Ok(true)
    })
    .await?;
    Ok(Json(file))
}

/// GET /api/projects/{id}/stats: dashboard numbers and the task heat map.
pub async fn get_stats(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<task::ProjectStats>, AppError> {
    let project = load_project(&app, &user.id, &id).await?;
    Ok(Json(task::stats(&project)))
}
