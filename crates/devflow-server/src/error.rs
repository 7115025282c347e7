use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use devflow_ai::GenerationError;
use devflow_core::error::DevflowError;

// ---------------------------------------------------------------------------
// Internal sentinels for explicit status codes
// ---------------------------------------------------------------------------

/// Carries an explicit HTTP 404 through the `anyhow::Error` chain.
#[derive(Debug)]
struct NotFoundError(String);

impl std::fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for NotFoundError {}

/// Carries an explicit HTTP 400 through the `anyhow::Error` chain.
#[derive(Debug)]
struct BadRequestError(String);

impl std::fmt::Display for BadRequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for BadRequestError {}

// ---------------------------------------------------------------------------
// AppError: unified error type for HTTP responses
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    /// Construct a 400 Bad Request error with the given message.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(BadRequestError(msg.into()).into())
    }

    /// Construct a 404 Not Found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self(NotFoundError(msg.into()).into())
    }
}

fn devflow_status(e: &DevflowError) -> StatusCode {
    match e {
        DevflowError::ProjectNotFound(_)
        | DevflowError::TaskNotFound(_)
        | DevflowError::FileNotFound(_) => StatusCode::NOT_FOUND,
        DevflowError::NotInitialized
        | DevflowError::InvalidTaskStatus(_)
        | DevflowError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        DevflowError::AccountExists(_) | DevflowError::AlreadyRunning(_) => StatusCode::CONFLICT,
        DevflowError::InvalidCredentials | DevflowError::Unauthorized => StatusCode::UNAUTHORIZED,
        DevflowError::NoEntryDocument => StatusCode::UNPROCESSABLE_ENTITY,
        DevflowError::Preview(_)
        | DevflowError::Store(_)
        | DevflowError::Archive(_)
        | DevflowError::Io(_)
        | DevflowError::Yaml(_)
        | DevflowError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn generation_status(e: &GenerationError) -> StatusCode {
    match e {
        GenerationError::MissingApiKey => StatusCode::SERVICE_UNAVAILABLE,
        GenerationError::Precondition(_) => StatusCode::UNPROCESSABLE_ENTITY,
        GenerationError::Transport(_)
        | GenerationError::Api { .. }
        | GenerationError::EmptyResponse
        | GenerationError::InvalidResponse { .. }
        | GenerationError::NoDiagram => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(n) = self.0.downcast_ref::<NotFoundError>() {
            let body = serde_json::json!({ "error": n.0.clone() });
            return (StatusCode::NOT_FOUND, axum::Json(body)).into_response();
        }
        if let Some(b) = self.0.downcast_ref::<BadRequestError>() {
            let body = serde_json::json!({ "error": b.0.clone() });
            return (StatusCode::BAD_REQUEST, axum::Json(body)).into_response();
        }

        // Model failures carry a short user-facing message plus the detail.
        if let Some(e) = self.0.downcast_ref::<GenerationError>() {
            let body = serde_json::json!({
                "error": e.user_message(),
                "detail": e.to_string(),
            });
            return (generation_status(e), axum::Json(body)).into_response();
        }

        let status = match self.0.downcast_ref::<DevflowError>() {
            Some(e) => {
                if matches!(e, DevflowError::Store(_)) {
                    tracing::error!(error = %e, "store failure");
                }
                devflow_status(e)
            }
            None => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %format!("{:#}", self.0), "request failed");
        }

        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
