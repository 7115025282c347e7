use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use devflow_ai::Generator;
use devflow_core::action::ActionTracker;
use devflow_core::config::Config;
use devflow_core::preview::resources::ResourceRegistry;
use devflow_core::preview::PreviewSession;
use devflow_core::simulation::SimulationResult;
use devflow_core::store::Store;
use tokio::sync::broadcast;

/// `(user_id, project_id)`: the scope of previews and pending simulations.
pub type ProjectScope = (String, String);

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub generator: Arc<dyn Generator>,
    pub config: Arc<Config>,
    pub registry: ResourceRegistry,
    pub previews: Arc<Mutex<HashMap<ProjectScope, PreviewSession>>>,
    pub simulations: Arc<Mutex<HashMap<ProjectScope, SimulationResult>>>,
    pub actions: ActionTracker,
    /// Carries the id of the user whose collection just changed.
    pub event_tx: broadcast::Sender<String>,
}

impl AppState {
    pub fn new(store: Store, generator: Arc<dyn Generator>, config: Config) -> Self {
        let (tx, _) = broadcast::channel(64);
        Self {
            store: Arc::new(store),
            generator,
            registry: ResourceRegistry::new(config.preview.resource_prefix.clone()),
            config: Arc::new(config),
            previews: Arc::new(Mutex::new(HashMap::new())),
            simulations: Arc::new(Mutex::new(HashMap::new())),
            actions: ActionTracker::new(),
            event_tx: tx,
        }
    }

    /// Open the store under `root` and build the state around it.
    pub fn open(
        root: &Path,
        generator: Arc<dyn Generator>,
        config: Config,
    ) -> devflow_core::Result<Self> {
        let store = Store::open(&devflow_core::paths::database_path(root))?;
        Ok(Self::new(store, generator, config))
    }

    /// Tell live subscribers that `user_id`'s collection changed.
    pub fn notify(&self, user_id: &str) {
        // No receivers is fine: nobody is subscribed.
        let _ = self.event_tx.send(user_id.to_string());
    }

    pub fn previews(&self) -> MutexGuard<'_, HashMap<ProjectScope, PreviewSession>> {
        self.previews.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn simulations(&self) -> MutexGuard<'_, HashMap<ProjectScope, SimulationResult>> {
        self.simulations.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Drop every preview and pending simulation owned by `user_id`.
    pub fn release_user(&self, user_id: &str) -> usize {
        let mut previews = self.previews();
        let before = previews.len();
        previews.retain(|(user, _), _| user != user_id);
        let released = before - previews.len();
        drop(previews);
        self.simulations().retain(|(user, _), _| user != user_id);
        if released > 0 {
            tracing::info!(user_id, released, "released previews on sign-out");
        }
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use devflow_ai::GenerationRequest;
    use devflow_core::code::GeneratedCode;
    use devflow_core::preview::PreviewOptions;

    struct Silent;

    #[async_trait]
    impl Generator for Silent {
        async fn generate(&self, _request: GenerationRequest) -> devflow_ai::Result<String> {
            Ok(String::new())
        }
    }

    fn state(dir: &tempfile::TempDir) -> AppState {
        AppState::open(dir.path(), Arc::new(Silent), Config::default()).unwrap()
    }

    #[test]
    fn registry_uses_configured_prefix() {
        let dir = tempfile::TempDir::new().unwrap();
        let app = state(&dir);
        assert_eq!(app.registry.prefix(), "/preview");
    }

    #[test]
    fn release_user_drops_only_their_previews() {
        let dir = tempfile::TempDir::new().unwrap();
        let app = state(&dir);
        let files = vec![GeneratedCode::new("index.html", "<p>hi</p>")];
        for user in ["alice", "bob"] {
            let mut session = PreviewSession::new();
            session
                .redeploy(&files, &app.registry, &PreviewOptions::default())
                .unwrap();
            app.previews()
                .insert((user.to_string(), "p1".to_string()), session);
        }
        assert_eq!(app.registry.len(), 2);

        assert_eq!(app.release_user("alice"), 1);
        assert_eq!(app.registry.len(), 1);
        assert!(app.previews().contains_key(&("bob".to_string(), "p1".to_string())));
    }

    #[test]
    fn notify_without_subscribers_is_harmless() {
        let dir = tempfile::TempDir::new().unwrap();
        state(&dir).notify("alice");
    }
}
