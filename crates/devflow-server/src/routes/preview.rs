use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::{Extension, Json};
use devflow_core::preview::{DeploymentInfo, PreviewOptions, PreviewSession};
use uuid::Uuid;

use super::load_project;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::state::AppState;

/// POST /api/projects/{id}/preview: (re)deploy the project's files.
///
/// A file set without an HTML document is rejected with 422 and the
/// previous deployment stays live.
pub async fn deploy(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<DeploymentInfo>, AppError> {
    let project = load_project(&app, &user.id, &id).await?;
    let options = PreviewOptions::from(&app.config.preview);

    let mut previews = app.previews();
    let session = previews
        .entry((user.id.clone(), id.clone()))
        .or_insert_with(PreviewSession::new);
    let info = match session.redeploy(&project.generated_code, &app.registry, &options) {
        Ok(deployment) => deployment.info(),
        Err(e) => {
            tracing::warn!(project_id = %id, error = %e, "preview deploy rejected");
            return Err(e.into());
        }
    };
    drop(previews);

    tracing::info!(project_id = %id, main = %info.main_url, "preview deployed");
    Ok(Json(info))
}

/// GET /api/projects/{id}/preview: the live deployment.
pub async fn get_preview(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<DeploymentInfo>, AppError> {
    app.previews()
        .get(&(user.id, id))
        .and_then(|s| s.current().map(|d| d.info()))
        .map(Json)
        .ok_or_else(|| AppError::not_found("no live preview"))
}

/// DELETE /api/projects/{id}/preview: release the live deployment.
pub async fn teardown(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Json<serde_json::Value> {
    let released = app
        .previews()
        .remove(&(user.id, id))
        .is_some_and(|mut s| s.teardown());
    Json(serde_json::json!({ "released": released }))
}

/// GET {resource_prefix}/:resource_id: serve a preview resource.
///
/// Resources are unguessable ids and are served without a session so the
/// embedded viewer can load them. The entry document is sandboxed.
pub async fn serve_resource(
    State(app): State<AppState>,
    Path(resource_id): Path<String>,
) -> Result<Response, AppError> {
    let resource = Uuid::parse_str(&resource_id)
        .ok()
        .and_then(|id| app.registry.get(id))
        .ok_or_else(|| AppError::not_found("preview resource not found"))?;

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, resource.media_type.mime())
        .header(header::CACHE_CONTROL, "no-store");
    if resource.is_entry {
        builder = builder.header(header::CONTENT_SECURITY_POLICY, "sandbox allow-scripts");
    }
    let response = builder
        .body(Body::from(resource.body.clone()))
        .map_err(|e| AppError(anyhow::anyhow!("response build error: {e}")))?;
    Ok(response)
}
