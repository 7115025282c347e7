pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post, put};
use axum::{middleware, Router};
use devflow_ai::{GeminiClient, Generator};
use devflow_core::config::Config;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let protected = Router::new()
        // Auth
        .route("/api/auth/signout", post(routes::auth::sign_out))
        .route("/api/auth/me", get(routes::auth::me))
        // Events (SSE)
        .route("/api/events", get(routes::events::sse_events))
        // Projects
        .route(
            "/api/projects",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/api/projects/{id}",
            get(routes::projects::get_project).patch(routes::projects::patch_project),
        )
        .route(
            "/api/session/selected",
            get(routes::projects::get_selected).put(routes::projects::put_selected),
        )
        // Board
        .route("/api/projects/{id}/board", get(routes::board::get_board))
        .route("/api/projects/{id}/stats", get(routes::board::get_stats))
        .route(
            "/api/projects/{id}/tasks/decompose",
            post(routes::board::decompose),
        )
        .route(
            "/api/projects/{id}/tasks/{task_id}/status",
            put(routes::board::move_task),
        )
        .route(
            "/api/projects/{id}/tasks/{task_id}",
            axum::routing::delete(routes::board::delete_task),
        )
        .route(
            "/api/projects/{id}/tasks/{task_id}/boilerplate",
            post(routes::board::generate_boilerplate),
        )
        // Generated code
        .route(
            "/api/projects/{id}/files",
            get(routes::files::list_files).put(routes::files::merge_files),
        )
        .route("/api/projects/{id}/files/tree", get(routes::files::file_tree))
        .route("/api/projects/{id}/scaffold", post(routes::files::scaffold))
        .route("/api/projects/{id}/export", get(routes::files::export_zip))
        // Chat
        .route("/api/projects/{id}/chat", post(routes::chat::send_message))
        .route("/api/tools/memory", post(routes::chat::memory))
        // Tools
        .route("/api/tools/{tool}", post(routes::tools::run_tool))
        .route(
            "/api/projects/{id}/architecture",
            post(routes::tools::architecture),
        )
        // Simulation
        .route(
            "/api/projects/{id}/simulation",
            post(routes::simulation::run_simulation)
                .get(routes::simulation::get_simulation)
                .delete(routes::simulation::discard_simulation),
        )
        .route(
            "/api/projects/{id}/simulation/approve",
            post(routes::simulation::approve_simulation),
        )
        // Preview
        .route(
            "/api/projects/{id}/preview",
            post(routes::preview::deploy)
                .get(routes::preview::get_preview)
                .delete(routes::preview::teardown),
        )
        // Actions
        .route("/api/actions", get(routes::actions::list_actions))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            auth::require_user,
        ));

    let resource_route = format!("{}/{{resource_id}}", app_state.registry.prefix());

    Router::new()
        .route("/api/auth/signup", post(routes::auth::sign_up))
        .route("/api/auth/signin", post(routes::auth::sign_in))
        .route("/api/config", get(routes::config::get_config))
        .route(&resource_route, get(routes::preview::serve_resource))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Build application state for `root` with a Gemini client configured from
/// the environment.
pub fn default_state(root: &Path) -> anyhow::Result<AppState> {
    let config = Config::load_or_default(root)?;
    for warning in config.validate() {
        tracing::warn!(message = %warning.message, "config warning");
    }
    let client = GeminiClient::from_env(&config.ai)?;
    let generator: Arc<dyn Generator> = Arc::new(client);
    Ok(AppState::open(root, generator, config)?)
}

/// Start the devflow HTTP service.
pub async fn serve(root: &Path, port: u16, open_browser: bool) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve_on(root, listener, open_browser).await
}

/// Start the devflow HTTP service on a pre-bound listener.
///
/// Unlike `serve`, this accepts a `TcpListener` that was already bound so the
/// caller can read the actual port before starting (useful when `port = 0` and
/// the OS picks a free port).
pub async fn serve_on(
    root: &Path,
    listener: tokio::net::TcpListener,
    open_browser: bool,
) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let app = build_router(default_state(root)?);

    tracing::info!("devflow server listening on http://localhost:{actual_port}");

    if open_browser {
        let url = format!("http://localhost:{actual_port}");
        let _ = open::that(&url);
    }

    axum::serve(listener, app).await?;
    Ok(())
}
