use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::Deserialize;

use super::blocking;
use crate::auth::{cleared_cookie, session_cookie, CurrentUser};
use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CredentialsBody {
    pub email: String,
    pub password: String,
}

/// POST /api/auth/signup: create an account and start a session.
pub async fn sign_up(
    State(app): State<AppState>,
    Json(body): Json<CredentialsBody>,
) -> Result<impl IntoResponse, AppError> {
    let store = app.store.clone();
    let session = blocking(move || store.sign_up(&body.email, &body.password)).await?;
    tracing::info!(user_id = %session.user.id, "account created");
    Ok((
        [(header::SET_COOKIE, session_cookie(&session.token))],
        Json(serde_json::json!({ "user": session.user, "token": session.token })),
    ))
}

/// POST /api/auth/signin: start a session with email and password.
pub async fn sign_in(
    State(app): State<AppState>,
    Json(body): Json<CredentialsBody>,
) -> Result<impl IntoResponse, AppError> {
    let store = app.store.clone();
    let session = blocking(move || store.sign_in(&body.email, &body.password)).await?;
    Ok((
        [(header::SET_COOKIE, session_cookie(&session.token))],
        Json(serde_json::json!({ "user": session.user, "token": session.token })),
    ))
}

/// POST /api/auth/signout: end the session and release the user's previews.
pub async fn sign_out(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let store = app.store.clone();
    let token = user.token.clone();
    blocking(move || store.sign_out(&token)).await?;
    let released = app.release_user(&user.id);
    Ok((
        [(header::SET_COOKIE, cleared_cookie())],
        Json(serde_json::json!({ "signed_out": true, "released_previews": released })),
    ))
}

/// GET /api/auth/me: the signed-in user.
pub async fn me(Extension(user): Extension<CurrentUser>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "id": user.id, "email": user.email }))
}
