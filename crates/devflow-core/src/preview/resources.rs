//! Process-wide registry of addressable preview resources.
//!
//! A resource address is `<prefix>/<uuid>`. Addresses stay valid until the
//! owning [`Deployment`](super::Deployment) releases them.

use super::media::MediaType;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub id: Uuid,
    /// Declared path of the file this resource was made from.
    pub path: String,
    pub media_type: MediaType,
    pub body: String,
    /// The rewritten entry document of a deployment.
    pub is_entry: bool,
}

type ResourceMap = HashMap<Uuid, Arc<Resource>>;

#[derive(Debug, Clone)]
pub struct ResourceRegistry {
    prefix: String,
    resources: Arc<RwLock<ResourceMap>>,
}

impl ResourceRegistry {
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
            resources: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn address(&self, id: Uuid) -> String {
        format!("{}/{}", self.prefix, id)
    }

    /// Parse an address produced by [`ResourceRegistry::address`].
    pub fn id_from_address(&self, address: &str) -> Option<Uuid> {
        address
            .strip_prefix(self.prefix.as_str())?
            .strip_prefix('/')
            .and_then(|s| Uuid::parse_str(s).ok())
    }

    fn read(&self) -> RwLockReadGuard<'_, ResourceMap> {
        self.resources.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, ResourceMap> {
        self.resources.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Publish a batch of resources at once.
    pub(crate) fn insert_all(&self, batch: Vec<Resource>) {
        let mut map = self.write();
        for resource in batch {
            map.insert(resource.id, Arc::new(resource));
        }
    }

    pub fn get(&self, id: Uuid) -> Option<Arc<Resource>> {
        self.read().get(&id).cloned()
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.read().contains_key(&id)
    }

    /// Remove the given resources; unknown ids are ignored.
    pub fn release(&self, ids: &[Uuid]) {
        let mut map = self.write();
        for id in ids {
            map.remove(id);
        }
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
