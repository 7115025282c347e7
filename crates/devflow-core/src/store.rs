//! Per-user project collections stored in redb.
//!
//! # Table design
//!
//! ```text
//! projects    "<user_id>/<project_id>" -> JSON Project
//! selections  "<user_id>"              -> last-selected project id
//! accounts    "<email>"                -> JSON Account      (see account.rs)
//! sessions    "<token>"                -> user id           (see account.rs)
//! ```
//!
//! A user's projects share the `<user_id>/` key prefix, so listing a
//! collection is a single range scan. Every mutation runs inside one write
//! transaction: redb serializes writers, so a merge is an atomic
//! read-modify-write, and concurrent merges from two sessions resolve
//! last-write-wins per field.

use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition};
use uuid::Uuid;

use crate::error::{DevflowError, Result};
use crate::project::{self, Project, ProjectPatch};

// ---------------------------------------------------------------------------
// Table definitions
// ---------------------------------------------------------------------------

pub(crate) const PROJECTS: TableDefinition<&str, &[u8]> = TableDefinition::new("projects");
pub(crate) const SELECTIONS: TableDefinition<&str, &str> = TableDefinition::new("selections");
pub(crate) const ACCOUNTS: TableDefinition<&str, &[u8]> = TableDefinition::new("accounts");
pub(crate) const SESSIONS: TableDefinition<&str, &str> = TableDefinition::new("sessions");

pub(crate) fn db_err(e: impl std::fmt::Display) -> DevflowError {
    DevflowError::Store(e.to_string())
}

/// User ids scope keys as `<user>/<project>`, so they must not contain `/`.
pub fn validate_user_id(user_id: &str) -> Result<()> {
    if user_id.trim().is_empty() {
        return Err(DevflowError::InvalidInput("user id is required".into()));
    }
    if user_id.contains('/') {
        return Err(DevflowError::InvalidInput(format!(
            "user id '{user_id}' must not contain '/'"
        )));
    }
    Ok(())
}

fn project_key(user_id: &str, project_id: &str) -> Result<String> {
    validate_user_id(user_id)?;
    Ok(format!("{user_id}/{project_id}"))
}

fn user_prefix(user_id: &str) -> Result<String> {
    validate_user_id(user_id)?;
    Ok(format!("{user_id}/"))
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// The document store: one redb database holding every user's collection.
pub struct Store {
    pub(crate) db: Database,
}

impl Store {
    /// Open or create the database at `path`, creating all tables.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            crate::io::ensure_dir(parent)?;
        }
        let db = Database::create(path).map_err(db_err)?;
        let wt = db.begin_write().map_err(db_err)?;
        wt.open_table(PROJECTS).map_err(db_err)?;
        wt.open_table(SELECTIONS).map_err(db_err)?;
        wt.open_table(ACCOUNTS).map_err(db_err)?;
        wt.open_table(SESSIONS).map_err(db_err)?;
        wt.commit().map_err(db_err)?;
        Ok(Self { db })
    }

    // -----------------------------------------------------------------------
    // Projects
    // -----------------------------------------------------------------------

    /// Create a project with empty tasks, messages and files. The id is
    /// assigned here and never changes.
    pub fn create_project(&self, user_id: &str, name: &str, description: &str) -> Result<Project> {
        project::validate_new(name, description)?;
        let project = Project::new(Uuid::new_v4().to_string(), name.trim(), description.trim());
        self.put(user_id, &project)?;
        tracing::debug!(user_id, project_id = %project.id, "created project");
        Ok(project)
    }

    /// All of a user's projects, newest first.
    pub fn list_projects(&self, user_id: &str) -> Result<Vec<Project>> {
        let prefix = user_prefix(user_id)?;
        let rt = self.db.begin_read().map_err(db_err)?;
        let table = rt.open_table(PROJECTS).map_err(db_err)?;

        let mut projects = Vec::new();
        for entry in table.range(prefix.as_str()..).map_err(db_err)? {
            let (k, v) = entry.map_err(db_err)?;
            if !k.value().starts_with(&prefix) {
                break;
            }
            let project: Project = serde_json::from_slice(v.value())?;
            projects.push(project);
        }
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(projects)
    }

    pub fn get_project(&self, user_id: &str, project_id: &str) -> Result<Project> {
        let rt = self.db.begin_read().map_err(db_err)?;
        let table = rt.open_table(PROJECTS).map_err(db_err)?;
        let key = project_key(user_id, project_id)?;
        let guard = table
            .get(key.as_str())
            .map_err(db_err)?
            .ok_or_else(|| DevflowError::ProjectNotFound(project_id.to_string()))?;
        Ok(serde_json::from_slice(guard.value())?)
    }

    /// Merge `patch` into the stored project and return the result.
    pub fn update_project(
        &self,
        user_id: &str,
        project_id: &str,
        patch: ProjectPatch,
    ) -> Result<Project> {
        let (project, _) = self.modify_project(user_id, project_id, |p| {
            let changed = !patch.is_empty();
            patch.apply(p)?;
            Ok(changed)
        })?;
        Ok(project)
    }

    /// Read-modify-write a project inside one write transaction.
    ///
    /// `f` returns whether it changed anything; when it returns `false` (or an
    /// error) the transaction is aborted and nothing is written.
    pub fn modify_project<F>(&self, user_id: &str, project_id: &str, f: F) -> Result<(Project, bool)>
    where
        F: FnOnce(&mut Project) -> Result<bool>,
    {
        let key = project_key(user_id, project_id)?;
        let wt = self.db.begin_write().map_err(db_err)?;
        let (project, changed) = {
            let mut table = wt.open_table(PROJECTS).map_err(db_err)?;
            let mut project: Project = {
                let guard = table
                    .get(key.as_str())
                    .map_err(db_err)?
                    .ok_or_else(|| DevflowError::ProjectNotFound(project_id.to_string()))?;
                serde_json::from_slice(guard.value())?
            };
            let changed = f(&mut project)?;
            if changed {
                let value = serde_json::to_vec(&project)?;
                table
                    .insert(key.as_str(), value.as_slice())
                    .map_err(db_err)?;
            }
            (project, changed)
        };
        if changed {
            wt.commit().map_err(db_err)?;
        } else {
            wt.abort().map_err(db_err)?;
        }
        Ok((project, changed))
    }

    fn put(&self, user_id: &str, project: &Project) -> Result<()> {
        let key = project_key(user_id, &project.id)?;
        let value = serde_json::to_vec(project)?;
        let wt = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = wt.open_table(PROJECTS).map_err(db_err)?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(db_err)?;
        }
        wt.commit().map_err(db_err)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Last-selected project
    // -----------------------------------------------------------------------

    pub fn selected_project_id(&self, user_id: &str) -> Result<Option<String>> {
        let rt = self.db.begin_read().map_err(db_err)?;
        let table = rt.open_table(SELECTIONS).map_err(db_err)?;
        let id = table
            .get(user_id)
            .map_err(db_err)?
            .map(|g| g.value().to_string());
        Ok(id)
    }

    /// Remember (or with `None`, forget) the user's selected project.
    pub fn select_project(&self, user_id: &str, project_id: Option<&str>) -> Result<()> {
        let wt = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = wt.open_table(SELECTIONS).map_err(db_err)?;
            match project_id {
                Some(id) => {
                    table.insert(user_id, id).map_err(db_err)?;
                }
                None => {
                    table.remove(user_id).map_err(db_err)?;
                }
            }
        }
        wt.commit().map_err(db_err)?;
        Ok(())
    }

    /// The project to reopen on reload. A stale selection is cleared.
    pub fn restore_selection(&self, user_id: &str) -> Result<Option<Project>> {
        let Some(id) = self.selected_project_id(user_id)? else {
            return Ok(None);
        };
        match self.get_project(user_id, &id) {
            Ok(project) => Ok(Some(project)),
            Err(DevflowError::ProjectNotFound(_)) => {
                self.select_project(user_id, None)?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::GeneratedCode;
    use crate::task::{self, Task};
    use crate::types::TaskStatus;
    use tempfile::TempDir;

    fn open_tmp() -> (TempDir, Store) {
        let dir = TempDir::new().unwrap();
        let store = Store::open(&dir.path().join("test.redb")).unwrap();
        (dir, store)
    }

    #[test]
    fn create_and_get_project() {
        let (_dir, store) = open_tmp();
        let created = store.create_project("alice", "Todo", "A todo app").unwrap();
        let loaded = store.get_project("alice", &created.id).unwrap();
        assert_eq!(loaded, created);
        assert!(loaded.tasks.is_empty());
    }

    #[test]
    fn collections_are_per_user() {
        let (_dir, store) = open_tmp();
        let p = store.create_project("alice", "Todo", "A todo app").unwrap();
        store.create_project("bob", "Blog", "A blog").unwrap();
        assert_eq!(store.list_projects("alice").unwrap().len(), 1);
        assert!(matches!(
            store.get_project("bob", &p.id),
            Err(DevflowError::ProjectNotFound(_))
        ));
        // "alice2" shares a string prefix with "alice" but not the key prefix.
        assert!(store.list_projects("alice2").unwrap().is_empty());
    }

    #[test]
    fn list_is_newest_first() {
        let (_dir, store) = open_tmp();
        let first = store.create_project("alice", "First", "one").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = store.create_project("alice", "Second", "two").unwrap();
        let ids: Vec<_> = store
            .list_projects("alice")
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[test]
    fn update_merges_fields() {
        let (_dir, store) = open_tmp();
        let p = store.create_project("alice", "Todo", "A todo app").unwrap();
        store
            .update_project(
                "alice",
                &p.id,
                ProjectPatch::generated_code(vec![GeneratedCode::new("index.html", "<html>")]),
            )
            .unwrap();
        let updated = store
            .update_project(
                "alice",
                &p.id,
                ProjectPatch::tasks(vec![Task::new("t1", "UI", "build", vec![])]),
            )
            .unwrap();
        assert_eq!(updated.generated_code.len(), 1);
        assert_eq!(updated.tasks.len(), 1);
        assert_eq!(updated.name, "Todo");
    }

    #[test]
    fn modify_without_change_writes_nothing() {
        let (_dir, store) = open_tmp();
        let p = store.create_project("alice", "Todo", "A todo app").unwrap();
        store
            .update_project(
                "alice",
                &p.id,
                ProjectPatch::tasks(vec![Task::new("t1", "UI", "build", vec![])]),
            )
            .unwrap();
        let (_, changed) = store
            .modify_project("alice", &p.id, |p| {
                task::move_task(&mut p.tasks, "t1", TaskStatus::Pending)
            })
            .unwrap();
        assert!(!changed);
        let (moved, changed) = store
            .modify_project("alice", &p.id, |p| {
                task::move_task(&mut p.tasks, "t1", TaskStatus::Done)
            })
            .unwrap();
        assert!(changed);
        assert_eq!(moved.tasks[0].status, TaskStatus::Done);
        assert_eq!(
            store.get_project("alice", &p.id).unwrap().tasks[0].status,
            TaskStatus::Done
        );
    }

    #[test]
    fn modify_error_leaves_project_untouched() {
        let (_dir, store) = open_tmp();
        let p = store.create_project("alice", "Todo", "A todo app").unwrap();
        let result = store.modify_project("alice", &p.id, |p| {
            p.name = "changed".into();
            task::delete_task(&mut p.tasks, "missing").map(|_| true)
        });
        assert!(result.is_err());
        assert_eq!(store.get_project("alice", &p.id).unwrap().name, "Todo");
    }

    #[test]
    fn selection_roundtrip_and_stale_cleanup() {
        let (_dir, store) = open_tmp();
        let p = store.create_project("alice", "Todo", "A todo app").unwrap();
        store.select_project("alice", Some(&p.id)).unwrap();
        assert_eq!(store.restore_selection("alice").unwrap().unwrap().id, p.id);

        store.select_project("alice", Some("gone")).unwrap();
        assert!(store.restore_selection("alice").unwrap().is_none());
        assert!(store.selected_project_id("alice").unwrap().is_none());
    }

    #[test]
    fn user_ids_cannot_nest() {
        let (_dir, store) = open_tmp();
        store.create_project("a", "Mine", "desc").unwrap();
        assert!(matches!(
            store.create_project("a/b", "Nested", "desc"),
            Err(DevflowError::InvalidInput(_))
        ));
        assert!(matches!(
            store.list_projects("a/b"),
            Err(DevflowError::InvalidInput(_))
        ));
        assert_eq!(store.list_projects("a").unwrap().len(), 1);
    }

    #[test]
    fn create_rejects_blank_name() {
        let (_dir, store) = open_tmp();
        assert!(matches!(
            store.create_project("alice", " ", "desc"),
            Err(DevflowError::InvalidInput(_))
        ));
    }
}
