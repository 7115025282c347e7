pub mod actions;
pub mod auth;
pub mod board;
pub mod chat;
pub mod config;
pub mod events;
pub mod files;
pub mod preview;
pub mod projects;
pub mod simulation;
pub mod tools;

use devflow_core::project::Project;

use crate::error::AppError;
use crate::state::AppState;

/// Run a synchronous store operation on the blocking pool.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> devflow_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let result = tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))?;
    Ok(result?)
}

/// Load one of `user_id`'s projects.
pub(crate) async fn load_project(
    app: &AppState,
    user_id: &str,
    project_id: &str,
) -> Result<Project, AppError> {
    let store = app.store.clone();
    let user_id = user_id.to_string();
    let project_id = project_id.to_string();
    blocking(move || store.get_project(&user_id, &project_id)).await
}

/// Read-modify-write a project and notify subscribers when it changed.
pub(crate) async fn modify_project<F>(
    app: &AppState,
    user_id: &str,
    project_id: &str,
    f: F,
) -> Result<Project, AppError>
where
    F: FnOnce(&mut Project) -> devflow_core::Result<bool> + Send + 'static,
{
    let store = app.store.clone();
    let uid = user_id.to_string();
    let pid = project_id.to_string();
    let (project, changed) = blocking(move || store.modify_project(&uid, &pid, f)).await?;
    if changed {
        app.notify(user_id);
    }
    Ok(project)
}
