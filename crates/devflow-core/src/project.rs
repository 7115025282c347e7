use crate::chat::ChatMessage;
use crate::code::GeneratedCode;
use crate::error::{DevflowError, Result};
use crate::task::Task;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub generated_code: Vec<GeneratedCode>,
    pub created_at: DateTime<Utc>,
}

impl Project {
    pub fn new(id: impl Into<String>, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            tasks: Vec::new(),
            messages: Vec::new(),
            generated_code: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

/// Validate the user-supplied fields of a new project.
pub fn validate_new(name: &str, description: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(DevflowError::InvalidInput("project name is required".into()));
    }
    if description.trim().is_empty() {
        return Err(DevflowError::InvalidInput(
            "project description is required".into(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// ProjectPatch
// ---------------------------------------------------------------------------

/// A partial update. Fields that are present replace the stored field
/// wholesale; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<Task>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<ChatMessage>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_code: Option<Vec<GeneratedCode>>,
}

impl ProjectPatch {
    pub fn tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks: Some(tasks),
            ..Default::default()
        }
    }

    pub fn messages(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages: Some(messages),
            ..Default::default()
        }
    }

    pub fn generated_code(files: Vec<GeneratedCode>) -> Self {
        Self {
            generated_code: Some(files),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.tasks.is_none()
            && self.messages.is_none()
            && self.generated_code.is_none()
    }

    /// Merge this patch into `project`. Identity and creation time never change.
    /// A present name or description must be non-blank, as at creation;
    /// on error `project` is left untouched.
    pub fn apply(self, project: &mut Project) -> Result<()> {
        validate_new(
            self.name.as_deref().unwrap_or(&project.name),
            self.description.as_deref().unwrap_or(&project.description),
        )?;
        if let Some(name) = self.name {
            project.name = name.trim().to_string();
        }
        if let Some(description) = self.description {
            project.description = description.trim().to_string();
        }
        if let Some(tasks) = self.tasks {
            project.tasks = tasks;
        }
        if let Some(messages) = self.messages {
            project.messages = messages;
        }
        if let Some(files) = self.generated_code {
            project.generated_code = crate::code::dedupe(&files);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_replaces_only_present_fields() {
        let mut project = Project::new("p1", "Todo", "A todo app");
        project.messages.push(ChatMessage::user("hello"));
        let created = project.created_at;

        ProjectPatch {
            name: Some("Todo v2".into()),
            tasks: Some(vec![Task::new("t1", "API", "build it", vec![])]),
            ..Default::default()
        }
        .apply(&mut project)
        .unwrap();

        assert_eq!(project.id, "p1");
        assert_eq!(project.name, "Todo v2");
        assert_eq!(project.description, "A todo app");
        assert_eq!(project.tasks.len(), 1);
        assert_eq!(project.messages.len(), 1);
        assert_eq!(project.created_at, created);
    }

    #[test]
    fn patch_generated_code_enforces_unique_paths() {
        let mut project = Project::new("p1", "Demo", "demo");
        ProjectPatch::generated_code(vec![
            GeneratedCode::new("a.txt", "1"),
            GeneratedCode::new("a.txt", "2"),
        ])
        .apply(&mut project)
        .unwrap();
        assert_eq!(project.generated_code, vec![GeneratedCode::new("a.txt", "2")]);
    }

    #[test]
    fn patch_rejects_blank_name_and_description() {
        let mut project = Project::new("p1", "Todo", "A todo app");
        let err = ProjectPatch {
            name: Some("  ".into()),
            ..Default::default()
        }
        .apply(&mut project)
        .unwrap_err();
        assert!(matches!(err, DevflowError::InvalidInput(_)));

        let err = ProjectPatch {
            name: Some("Renamed".into()),
            description: Some(String::new()),
            ..Default::default()
        }
        .apply(&mut project)
        .unwrap_err();
        assert!(matches!(err, DevflowError::InvalidInput(_)));
        assert_eq!(project.name, "Todo");
        assert_eq!(project.description, "A todo app");
    }

    #[test]
    fn patch_json_omits_absent_fields() {
        let patch = ProjectPatch::messages(vec![]);
        let json = serde_json::to_value(&patch).unwrap();
        assert!(json.get("tasks").is_none());
        assert!(json["messages"].is_array());
        let parsed: ProjectPatch = serde_json::from_str(r#"{"name":"x"}"#).unwrap();
        assert_eq!(parsed.name.as_deref(), Some("x"));
        assert!(parsed.tasks.is_none());
    }

    #[test]
    fn validate_new_requires_fields() {
        assert!(validate_new("", "desc").is_err());
        assert!(validate_new("name", "  ").is_err());
        assert!(validate_new("name", "desc").is_ok());
    }
}
