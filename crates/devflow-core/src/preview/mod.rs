//! Static preview deployment.
//!
//! Turns a project's generated files into one browsable entry document plus
//! auxiliary resources held in a [`ResourceRegistry`]. A [`Deployment`] owns
//! its resources and releases them when dropped; [`PreviewSession`] enforces
//! release-before-replace across redeploys.

pub mod import_map;
pub mod media;
pub mod resources;
pub mod rewrite;

pub use import_map::ImportMap;
pub use media::MediaType;
pub use resources::{Resource, ResourceRegistry};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use crate::code::{self, GeneratedCode};
use crate::error::{DevflowError, Result};
use crate::paths;
use rewrite::RewriteContext;

// ---------------------------------------------------------------------------
// Entry selection
// ---------------------------------------------------------------------------

/// Pick the entry document: an exact (case-insensitive) `index.html`, else the
/// first `.html` file. Later duplicates of a path win, as everywhere else.
pub fn select_entry(files: &[GeneratedCode]) -> Result<usize> {
    let is_index = |f: &GeneratedCode| f.path.trim().eq_ignore_ascii_case("index.html");
    let is_html = |f: &GeneratedCode| f.path.trim().to_ascii_lowercase().ends_with(".html");
    files
        .iter()
        .position(is_index)
        .or_else(|| files.iter().position(is_html))
        .ok_or(DevflowError::NoEntryDocument)
}

// ---------------------------------------------------------------------------
// Deployment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PreviewOptions {
    pub transpiler_url: String,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            transpiler_url: crate::config::PreviewConfig::default().transpiler_url,
        }
    }
}

impl From<&crate::config::PreviewConfig> for PreviewOptions {
    fn from(cfg: &crate::config::PreviewConfig) -> Self {
        Self {
            transpiler_url: cfg.transpiler_url.clone(),
        }
    }
}

/// A live preview. Dropping it releases every resource it created.
#[derive(Debug)]
pub struct Deployment {
    registry: ResourceRegistry,
    main: Uuid,
    assets: Vec<Uuid>,
    entry_path: String,
    import_map: ImportMap,
    created_at: DateTime<Utc>,
}

/// Serializable summary of a [`Deployment`].
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentInfo {
    pub main_url: String,
    pub asset_urls: Vec<String>,
    pub entry_path: String,
    pub import_map: ImportMap,
    pub created_at: DateTime<Utc>,
}

impl Deployment {
    pub fn main_id(&self) -> Uuid {
        self.main
    }

    pub fn main_address(&self) -> String {
        self.registry.address(self.main)
    }

    pub fn asset_addresses(&self) -> Vec<String> {
        self.assets.iter().map(|id| self.registry.address(*id)).collect()
    }

    /// Every resource id this deployment owns, main document first.
    pub fn resource_ids(&self) -> Vec<Uuid> {
        std::iter::once(self.main).chain(self.assets.iter().copied()).collect()
    }

    pub fn entry_path(&self) -> &str {
        &self.entry_path
    }

    pub fn import_map(&self) -> &ImportMap {
        &self.import_map
    }

    /// The rewritten entry document.
    pub fn main_document(&self) -> Option<String> {
        self.registry.get(self.main).map(|r| r.body.clone())
    }

    pub fn info(&self) -> DeploymentInfo {
        DeploymentInfo {
            main_url: self.main_address(),
            asset_urls: self.asset_addresses(),
            entry_path: self.entry_path.clone(),
            import_map: self.import_map.clone(),
            created_at: self.created_at,
        }
    }
}

impl Drop for Deployment {
    fn drop(&mut self) {
        let ids = self.resource_ids();
        self.registry.release(&ids);
        tracing::debug!(main = %self.main, released = ids.len(), "released preview resources");
    }
}

/// Build a deployment from `files`.
///
/// Fails with [`DevflowError::NoEntryDocument`] when there is no HTML file.
/// Resources are published only after every step has succeeded, so a failure
/// creates none.
pub fn deploy(
    files: &[GeneratedCode],
    registry: &ResourceRegistry,
    options: &PreviewOptions,
) -> Result<Deployment> {
    let files = code::dedupe(files);
    let entry_index = select_entry(&files)?;
    let entry = &files[entry_index];

    let needs_transpiler = files.iter().any(|f| media::is_component_source(&f.path));

    let mut batch = Vec::with_capacity(files.len());
    let mut addresses: HashMap<String, String> = HashMap::new();
    let mut import_map = ImportMap::default();

    for (i, file) in files.iter().enumerate() {
        if i == entry_index {
            continue;
        }
        let media_type = MediaType::from_path(&file.path);
        let id = Uuid::new_v4();
        let address = registry.address(id);
        let key = paths::normalize_file_path(&file.path).to_string();

        if media_type.is_script() {
            import_map.register_script(&key, &address);
        }
        addresses.insert(key, address);
        batch.push(Resource {
            id,
            path: file.path.clone(),
            media_type,
            body: file.content.clone(),
            is_entry: false,
        });
    }

    let document = rewrite::rewrite_entry(
        &entry.content,
        &RewriteContext {
            addresses: &addresses,
            import_map: &import_map,
            transpiler_url: needs_transpiler.then_some(options.transpiler_url.as_str()),
        },
    )?;

    let main = Uuid::new_v4();
    let assets: Vec<Uuid> = batch.iter().map(|r| r.id).collect();
    batch.push(Resource {
        id: main,
        path: entry.path.clone(),
        media_type: MediaType::Html,
        body: document,
        is_entry: true,
    });
    registry.insert_all(batch);

    tracing::info!(
        entry = %entry.path,
        assets = assets.len(),
        imports = import_map.len(),
        "deployed preview"
    );

    Ok(Deployment {
        registry: registry.clone(),
        main,
        assets,
        entry_path: entry.path.clone(),
        import_map,
        created_at: Utc::now(),
    })
}

// ---------------------------------------------------------------------------
// PreviewSession
// ---------------------------------------------------------------------------

/// Holds at most one live deployment for a view.
#[derive(Debug, Default)]
pub struct PreviewSession {
    current: Option<Deployment>,
}

impl PreviewSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current deployment.
    ///
    /// The entry-document check runs first: when it fails the previous
    /// deployment stays live. Otherwise the previous deployment is released
    /// before the new one is created.
    pub fn redeploy(
        &mut self,
        files: &[GeneratedCode],
        registry: &ResourceRegistry,
        options: &PreviewOptions,
    ) -> Result<&Deployment> {
        select_entry(files)?;
        if let Some(old) = self.current.take() {
            tracing::info!(main = %old.main_id(), "releasing previous preview");
        }
        let deployment = deploy(files, registry, options)?;
        Ok(self.current.insert(deployment))
    }

    pub fn current(&self) -> Option<&Deployment> {
        self.current.as_ref()
    }

    /// Release the current deployment, if any. Returns whether one existed.
    pub fn teardown(&mut self) -> bool {
        self.current.take().is_some()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ResourceRegistry {
        ResourceRegistry::new("/preview")
    }

    fn site() -> Vec<GeneratedCode> {
        vec![
            GeneratedCode::new("styles.css", "body { color: red; }"),
            GeneratedCode::new(
                "index.html",
                r#"<html><head><link rel="stylesheet" href="styles.css"></head><body><img src="img/logo.png"><script type="module" src="/src/index.js"></script></body></html>"#,
            ),
            GeneratedCode::new("img/logo.png", "PNG"),
            GeneratedCode::new("src/index.js", "import './util';"),
            GeneratedCode::new("src/util.js", "export const x = 1;"),
        ]
    }

    #[test]
    fn no_entry_document_creates_nothing() {
        let registry = registry();
        let files = vec![
            GeneratedCode::new("app.js", "x"),
            GeneratedCode::new("README.md", "y"),
        ];
        let err = deploy(&files, &registry, &PreviewOptions::default()).unwrap_err();
        assert!(matches!(err, DevflowError::NoEntryDocument));
        assert_eq!(
            err.to_string(),
            "Deployment failed: No HTML file found in the project."
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn index_html_wins_regardless_of_order() {
        let a = GeneratedCode::new("about.html", "<p>about</p>");
        let b = GeneratedCode::new("INDEX.HTML", "<p>home</p>");
        assert_eq!(select_entry(&[a.clone(), b.clone()]).unwrap(), 1);
        assert_eq!(select_entry(&[b, a]).unwrap(), 0);
    }

    #[test]
    fn first_html_used_without_index() {
        let files = vec![
            GeneratedCode::new("app.js", ""),
            GeneratedCode::new("pages/home.html", ""),
            GeneratedCode::new("pages/about.html", ""),
        ];
        assert_eq!(select_entry(&files).unwrap(), 1);
    }

    #[test]
    fn equivalent_paths_publish_one_resource() {
        let registry = registry();
        let files = vec![
            GeneratedCode::new("index.html", "<p>hi</p>"),
            GeneratedCode::new("app.js", "old"),
            GeneratedCode::new("./app.js", "new"),
        ];
        let deployment = deploy(&files, &registry, &PreviewOptions::default()).unwrap();
        assert_eq!(deployment.asset_addresses().len(), 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn deploy_rewrites_and_registers_resources() {
        let registry = registry();
        let deployment = deploy(&site(), &registry, &PreviewOptions::default()).unwrap();

        assert_eq!(deployment.entry_path(), "index.html");
        assert_eq!(deployment.asset_addresses().len(), 4);
        assert_eq!(registry.len(), 5);

        let main = registry.get(deployment.main_id()).unwrap();
        assert!(main.is_entry);
        assert_eq!(main.media_type, MediaType::Html);

        let doc = deployment.main_document().unwrap();
        assert!(!doc.contains(r#"href="styles.css""#));
        assert!(!doc.contains(r#"src="img/logo.png""#));
        assert!(!doc.contains(r#"src="/src/index.js""#));
        assert!(!doc.contains("babel"));

        let map = deployment.import_map();
        let index = map.get("/src/index.js").unwrap();
        assert_eq!(map.get("/src/index"), Some(index));
        assert_eq!(map.get("/src"), Some(index));
        assert_eq!(map.get("/src/util"), map.get("/src/util.js"));
        assert!(map.get("/styles.css").is_none());
    }

    #[test]
    fn resources_carry_media_types() {
        let registry = registry();
        let deployment = deploy(&site(), &registry, &PreviewOptions::default()).unwrap();
        let types: Vec<MediaType> = deployment
            .resource_ids()
            .iter()
            .filter_map(|id| registry.get(*id))
            .map(|r| r.media_type)
            .collect();
        assert!(types.contains(&MediaType::Css));
        assert!(types.contains(&MediaType::Png));
        assert_eq!(types.iter().filter(|t| **t == MediaType::Script).count(), 2);
    }

    #[test]
    fn component_source_pulls_in_transpiler() {
        let registry = registry();
        let files = vec![
            GeneratedCode::new(
                "index.html",
                r#"<html><head></head><body><script type="module" src="src/App.jsx"></script></body></html>"#,
            ),
            GeneratedCode::new("src/App.jsx", "export default () => <div />;"),
        ];
        let options = PreviewOptions {
            transpiler_url: "https://cdn.example.com/babel.js".into(),
        };
        let deployment = deploy(&files, &registry, &options).unwrap();
        let doc = deployment.main_document().unwrap();
        assert!(doc.contains(r#"<script src="https://cdn.example.com/babel.js"></script>"#));
        assert!(doc.contains(r#"type="text/babel""#));
    }

    #[test]
    fn drop_releases_resources() {
        let registry = registry();
        let deployment = deploy(&site(), &registry, &PreviewOptions::default()).unwrap();
        let ids = deployment.resource_ids();
        drop(deployment);
        assert!(ids.iter().all(|id| !registry.contains(*id)));
        assert!(registry.is_empty());
    }

    #[test]
    fn redeploy_releases_previous_addresses() {
        let registry = registry();
        let mut session = PreviewSession::new();
        let first = session
            .redeploy(&site(), &registry, &PreviewOptions::default())
            .unwrap()
            .resource_ids();
        let second = session
            .redeploy(&site(), &registry, &PreviewOptions::default())
            .unwrap()
            .resource_ids();

        assert!(first.iter().all(|id| !registry.contains(*id)));
        assert!(second.iter().all(|id| registry.contains(*id)));
        assert_eq!(registry.len(), second.len());
    }

    #[test]
    fn failed_redeploy_keeps_previous_preview() {
        let registry = registry();
        let mut session = PreviewSession::new();
        let first = session
            .redeploy(&site(), &registry, &PreviewOptions::default())
            .unwrap()
            .resource_ids();

        let err = session
            .redeploy(
                &[GeneratedCode::new("main.js", "x")],
                &registry,
                &PreviewOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, DevflowError::NoEntryDocument));
        assert!(first.iter().all(|id| registry.contains(*id)));
        assert!(session.current().is_some());
    }

    #[test]
    fn teardown_releases() {
        let registry = registry();
        let mut session = PreviewSession::new();
        session
            .redeploy(&site(), &registry, &PreviewOptions::default())
            .unwrap();
        assert!(session.teardown());
        assert!(registry.is_empty());
        assert!(!session.teardown());
    }

    #[test]
    fn duplicate_paths_use_latest_content() {
        let registry = registry();
        let files = vec![
            GeneratedCode::new("index.html", "<head></head><p>old</p>"),
            GeneratedCode::new("index.html", "<head></head><p>new</p>"),
        ];
        let deployment = deploy(&files, &registry, &PreviewOptions::default()).unwrap();
        assert!(deployment.main_document().unwrap().contains("<p>new</p>"));
        assert!(deployment.asset_addresses().is_empty());
    }
}
