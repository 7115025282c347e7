use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use devflow_core::project::{Project, ProjectPatch};
use serde::Deserialize;

use super::{blocking, load_project};
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateProjectBody {
    pub name: String,
    pub description: String,
}

#[derive(Deserialize)]
pub struct SelectBody {
    pub project_id: Option<String>,
}

/// GET /api/projects: the user's projects, newest first.
pub async fn list_projects(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<Project>>, AppError> {
    let store = app.store.clone();
    let projects = blocking(move || store.list_projects(&user.id)).await?;
    Ok(Json(projects))
}

/// POST /api/projects: create a project and make it the selected one.
pub async fn create_project(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<CreateProjectBody>,
) -> Result<(StatusCode, Json<Project>), AppError> {
    let store = app.store.clone();
    let uid = user.id.clone();
    let project = blocking(move || {
        let project = store.create_project(&uid, &body.name, &body.description)?;
        store.select_project(&uid, Some(&project.id))?;
        Ok(project)
    })
    .await?;
    tracing::info!(user_id = %user.id, project_id = %project.id, "project created");
    app.notify(&user.id);
    Ok((StatusCode::CREATED, Json(project)))
}

/// GET /api/projects/{id}
pub async fn get_project(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<Project>, AppError> {
    Ok(Json(load_project(&app, &user.id, &id).await?))
}

/// PATCH /api/projects/{id}: partial merge; absent fields are kept.
pub async fn patch_project(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(patch): Json<ProjectPatch>,
) -> Result<Json<Project>, AppError> {
    if patch.is_empty() {
        return Ok(Json(load_project(&app, &user.id, &id).await?));
    }
    let store = app.store.clone();
    let uid = user.id.clone();
    let project = blocking(move || store.update_project(&uid, &id, patch)).await?;
    app.notify(&user.id);
    Ok(Json(project))
}

/// GET /api/session/selected: the project to reopen, or `null`.
pub async fn get_selected(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Option<Project>>, AppError> {
    let store = app.store.clone();
    let project = blocking(move || store.restore_selection(&user.id)).await?;
    Ok(Json(project))
}

/// PUT /api/session/selected: remember the selected project. An unknown id
/// clears the selection.
pub async fn put_selected(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<SelectBody>,
) -> Result<Json<Option<Project>>, AppError> {
    let store = app.store.clone();
    let project = blocking(move || {
        let Some(id) = body.project_id.as_deref() else {
            store.select_project(&user.id, None)?;
            return Ok(None);
        };
        match store.get_project(&user.id, id) {
            Ok(project) => {
                store.select_project(&user.id, Some(id))?;
                Ok(Some(project))
            }
            Err(devflow_core::DevflowError::ProjectNotFound(_)) => {
                store.select_project(&user.id, None)?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    })
    .await?;
    Ok(Json(project))
}
