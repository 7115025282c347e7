use axum::extract::{Path, State};
use axum::{Extension, Json};
use devflow_ai::Tool;
use devflow_core::action::ActionKey;
use serde::Deserialize;

use super::load_project;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ToolBody {
    pub input: String,
    #[serde(default)]
    pub language: Option<String>,
}

/// POST /api/tools/{tool}: run one of the single-input code tools.
pub async fn run_tool(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(name): Path<String>,
    Json(body): Json<ToolBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let tool: Tool = name.parse().map_err(AppError::bad_request)?;
    if body.input.trim().is_empty() {
        return Err(AppError::bad_request("input must not be empty"));
    }

    let guard = app
        .actions
        .start(ActionKey::new(&user.id, tool.as_str(), ""))?;
    let output = guard.finish(
        devflow_ai::tools::run_tool(
            app.generator.as_ref(),
            tool,
            &body.input,
            body.language.as_deref(),
        )
        .await,
    )?;
    Ok(Json(serde_json::json!({ "tool": tool.as_str(), "output": output })))
}

/// POST /api/projects/{id}/architecture: Mermaid diagram of the project.
pub async fn architecture(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let project = load_project(&app, &user.id, &id).await?;
    let guard = app
        .actions
        .start(ActionKey::new(&user.id, "architecture", &id))?;
    let diagram = guard.finish(
        devflow_ai::tools::generate_architecture_diagram(app.generator.as_ref(), &project).await,
    )?;
    Ok(Json(serde_json::json!({ "project_id": id, "diagram": diagram })))
}
