use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use devflow_core::action::ActionKey;
use devflow_core::code::{self, GeneratedCode};
use devflow_core::{export, paths};
use serde::Deserialize;

use super::{load_project, modify_project};
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct MergeFilesBody {
    pub files: Vec<GeneratedCode>,
}

#[derive(Deserialize, Default)]
pub struct ScaffoldBody {
    #[serde(default)]
    pub description: Option<String>,
}

/// GET /api/projects/{id}/files
pub async fn list_files(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<Vec<GeneratedCode>>, AppError> {
    let project = load_project(&app, &user.id, &id).await?;
    Ok(Json(project.generated_code))
}

/// GET /api/projects/{id}/files/tree: nested directory view of the paths.
pub async fn file_tree(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let project = load_project(&app, &user.id, &id).await?;
    Ok(Json(serde_json::json!(code::file_tree(&project.generated_code))))
}

/// PUT /api/projects/{id}/files: override-by-path merge of edited files.
pub async fn merge_files(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(body): Json<MergeFilesBody>,
) -> Result<Json<Vec<GeneratedCode>>, AppError> {
    if body
        .files
        .iter()
        .any(|f| paths::normalize_file_path(&f.path).is_empty())
    {
        return Err(AppError::bad_request("file path must not be empty"));
    }
    let project = modify_project(&app, &user.id, &id, move |p| {
        let any = !body.files.is_empty();
        code::merge(&mut p.generated_code, body.files);
        Ok(any)
    })
    .await?;
    Ok(Json(project.generated_code))
}

/// POST /api/projects/{id}/scaffold: replace the project's code with a
/// generated starter file set.
pub async fn scaffold(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(body): Json<ScaffoldBody>,
) -> Result<Json<Vec<GeneratedCode>>, AppError> {
    let project = load_project(&app, &user.id, &id).await?;
    let description = body
        .description
        .filter(|d| !d.trim().is_empty())
        .unwrap_or(project.description);

    let guard = app
        .actions
        .start(ActionKey::new(&user.id, "scaffold", &id))?;
    let files = guard.finish(
        devflow_ai::tools::generate_project_scaffold(app.generator.as_ref(), &description).await,
    )?;
    tracing::info!(project_id = %id, count = files.len(), "scaffold generated");

    let replacement = files.clone();
    modify_project(&app, &user.id, &id, move |p| {
        p.generated_code = replacement;
        Ok(true)
    })
    .await?;
    Ok(Json(files))
}

/// GET /api/projects/{id}/export: the generated code as a zip download.
pub async fn export_zip(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let project = load_project(&app, &user.id, &id).await?;
    if project.generated_code.is_empty() {
        return Err(AppError::bad_request("project has no generated code to export"));
    }
    let name = export::archive_name(&project.name);
    let bytes =
        tokio::task::spawn_blocking(move || export::zip_files(&project.generated_code))
            .await
            .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{name}\""),
            ),
        ],
        bytes,
    ))
}
