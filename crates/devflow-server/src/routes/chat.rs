use axum::extract::{Path, State};
use axum::{Extension, Json};
use devflow_core::action::ActionKey;
use devflow_core::chat::{self, ChatMessage, APOLOGY};
use serde::Deserialize;

use super::modify_project;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ChatBody {
    pub text: String,
}

#[derive(Deserialize)]
pub struct MemoryBody {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    pub input: String,
}

/// POST /api/projects/{id}/chat: persist the user's message, ask the model,
/// persist the reply. A failed call appends the apology instead.
pub async fn send_message(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(body): Json<ChatBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let text = body.text.trim().to_string();
    if text.is_empty() {
        return Err(AppError::bad_request("message must not be empty"));
    }

    let guard = app.actions.start(ActionKey::new(&user.id, "chat", &id))?;
    let question = ChatMessage::user(text);
    let asked = question.clone();
    let project = modify_project(&app, &user.id, &id, move |p| {
        chat::append(&mut p.messages, asked);
        Ok(true)
    })
    .await?;

    let result =
        devflow_ai::tools::continue_conversation(app.generator.as_ref(), &project.messages, &project)
            .await;
    let (reply, error) = match result {
        Ok(text) => {
            guard.succeed();
            (ChatMessage::ai(text), None)
        }
        Err(e) => {
            tracing::error!(project_id = %id, error = %e, "chat reply failed");
            guard.fail(e.user_message());
            (ChatMessage::ai(APOLOGY), Some(e.user_message()))
        }
    };

    let stored = reply.clone();
    modify_project(&app, &user.id, &id, move |p| {
        chat::append(&mut p.messages, stored);
        Ok(true)
    })
    .await?;

    Ok(Json(serde_json::json!({
        "message": question,
        "reply": reply,
        "error": error,
    })))
}

/// POST /api/tools/memory: one turn of the ephemeral memory chat. The
/// caller holds the history; nothing is stored.
pub async fn memory(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<MemoryBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    if body.input.trim().is_empty() {
        return Err(AppError::bad_request("input must not be empty"));
    }
    let guard = app.actions.start(ActionKey::new(&user.id, "memory", ""))?;
    let reply = guard.finish(
        devflow_ai::tools::ask_memory_agent(app.generator.as_ref(), &body.messages, &body.input)
            .await,
    )?;
    Ok(Json(serde_json::json!({ "reply": ChatMessage::ai(reply) })))
}
