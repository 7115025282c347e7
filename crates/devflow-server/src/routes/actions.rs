use axum::extract::State;
use axum::{Extension, Json};
use devflow_core::action::ActionEntry;

use crate::auth::CurrentUser;
use crate::state::AppState;

/// GET /api/actions: state of every AI-backed action the user has started.
pub async fn list_actions(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Json<Vec<ActionEntry>> {
    Json(app.actions.list(&user.id))
}
