pub mod chat;
pub mod code;
pub mod config;
pub mod export;
pub mod generate;
pub mod init;
pub mod preview;
pub mod project;
pub mod serve;
pub mod task;
pub mod tool;

use anyhow::Context as _;
use devflow_ai::GeminiClient;
use devflow_core::config::Config;
use devflow_core::project::Project;
use devflow_core::store::{self, Store};
use devflow_core::{paths, DevflowError};
use std::future::Future;
use std::path::PathBuf;

/// Global options every command runs with.
pub struct Context {
    pub root: PathBuf,
    pub user: String,
    pub json: bool,
}

impl Context {
    pub fn config(&self) -> anyhow::Result<Config> {
        Config::load(&self.root).context("failed to load config")
    }

    /// Open the store. Requires `devflow init` to have run.
    pub fn store(&self) -> anyhow::Result<Store> {
        store::validate_user_id(&self.user).context("invalid --user")?;
        if !paths::devflow_dir(&self.root).is_dir() {
            return Err(DevflowError::NotInitialized.into());
        }
        Store::open(&paths::database_path(&self.root)).context("failed to open store")
    }

    /// The project named by `explicit`, else the last-selected one.
    pub fn project(&self, store: &Store, explicit: Option<&str>) -> anyhow::Result<Project> {
        match explicit {
            Some(id) => store
                .get_project(&self.user, id)
                .with_context(|| format!("project '{id}' not found")),
            None => store.restore_selection(&self.user)?.ok_or_else(|| {
                anyhow::anyhow!("no project selected: run `devflow project select <id>`")
            }),
        }
    }

    pub fn generator(&self) -> anyhow::Result<GeminiClient> {
        let config = self.config()?;
        let client = GeminiClient::from_env(&config.ai)?;
        if !client.has_api_key() {
            anyhow::bail!("no API key: set GEMINI_API_KEY (or API_KEY) to use AI features");
        }
        Ok(client)
    }
}

/// Drive one async generation call to completion.
pub fn block_on<F: Future>(future: F) -> anyhow::Result<F::Output> {
    let rt = tokio::runtime::Runtime::new()?;
    Ok(rt.block_on(future))
}
