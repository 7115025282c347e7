use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Extension;
use futures::stream::{self, StreamExt as _};
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;

use crate::auth::CurrentUser;
use crate::state::AppState;

/// GET /api/events: SSE stream of the user's full project list.
///
/// A `snapshot` event is sent on connect and again after every write to the
/// user's collection. A lagged receiver just triggers a fresh snapshot.
pub async fn sse_events(
    State(app): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> impl axum::response::IntoResponse {
    let rx = app.event_tx.subscribe();
    let wanted = user.id.clone();
    let changes = BroadcastStream::new(rx).filter_map(move |msg| {
        let relevant = match msg {
            Ok(user_id) => user_id == wanted,
            Err(_) => true,
        };
        futures::future::ready(relevant.then_some(()))
    });

    let user_id = user.id;
    let stream = stream::once(futures::future::ready(()))
        .chain(changes)
        .then(move |()| snapshot(app.clone(), user_id.clone()))
        .filter_map(futures::future::ready)
        .map(Ok::<Event, Infallible>);
    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn snapshot(app: AppState, user_id: String) -> Option<Event> {
    let store = app.store.clone();
    let uid = user_id.clone();
    let projects = match tokio::task::spawn_blocking(move || store.list_projects(&uid)).await {
        Ok(Ok(projects)) => projects,
        Ok(Err(e)) => {
            tracing::error!(%user_id, error = %e, "snapshot read failed");
            return None;
        }
        Err(e) => {
            tracing::error!(%user_id, error = %e, "snapshot task failed");
            return None;
        }
    };
    Event::default().event("snapshot").json_data(&projects).ok()
}
