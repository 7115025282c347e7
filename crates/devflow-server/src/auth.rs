use axum::{
    body::Body,
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::state::AppState;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "devflow_session";

/// The signed-in user, inserted as a request extension by [`require_user`].
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub email: String,
    pub token: String,
}

/// Axum middleware that resolves the session token to an account.
///
/// The token is read from the `devflow_session` cookie, falling back to an
/// `Authorization: Bearer` header. Requests without a valid session get a
/// 401 with a JSON body.
pub async fn require_user(State(app): State<AppState>, mut req: Request, next: Next) -> Response {
    let Some(token) = session_token(req.headers()) else {
        return unauthorized();
    };

    let store = app.store.clone();
    let lookup = token.clone();
    let account = match tokio::task::spawn_blocking(move || store.account_for_token(&lookup)).await
    {
        Ok(Ok(account)) => account,
        Ok(Err(devflow_core::DevflowError::Unauthorized)) => return unauthorized(),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "session lookup failed");
            return unauthorized();
        }
        Err(e) => {
            tracing::error!(error = %e, "session lookup task failed");
            return unauthorized();
        }
    };

    req.extensions_mut().insert(CurrentUser {
        id: account.id,
        email: account.email,
        token,
    });
    next.run(req).await
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Extract the session token from the cookie or the bearer header.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(cookies) = headers.get("cookie").and_then(|v| v.to_str().ok()) {
        for part in cookies.split(';') {
            if let Some(val) = part.trim().strip_prefix("devflow_session=") {
                if !val.is_empty() {
                    return Some(val.to_string());
                }
            }
        }
    }
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// `Set-Cookie` value that stores `token`.
pub fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/")
}

/// `Set-Cookie` value that clears the session.
pub fn cleared_cookie() -> String {
    format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
}

fn unauthorized() -> Response {
    Response::builder()
        .status(401)
        .header("Content-Type", "application/json")
        .body(Body::from(r#"{"error":"unauthorized"}"#))
        .expect("infallible: all header values are valid ASCII")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
