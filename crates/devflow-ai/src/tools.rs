//! The AI-backed features. Each builds a prompt, makes one call through a
//! [`Generator`] and parses the reply.

use chrono::Utc;
use devflow_core::chat::ChatMessage;
use devflow_core::code::{self, GeneratedCode};
use devflow_core::project::Project;
use devflow_core::simulation::{SimulationResult, SimulationTurn};
use devflow_core::task::{self, Task};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::client::Generator;
use crate::error::GenerationError;
use crate::types::{GenerationRequest, ModelTier, Tool};
use crate::{extract, prompts, schema, Result};

// ─── Structured reply shapes ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct TaskDraft {
    title: String,
    description: String,
    #[serde(default)]
    files: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct FileDraft {
    #[serde(rename = "fileName")]
    file_name: String,
    content: String,
}

impl From<FileDraft> for GeneratedCode {
    fn from(f: FileDraft) -> Self {
        GeneratedCode::new(f.file_name, f.content)
    }
}

#[derive(Debug, Deserialize)]
struct SimulationDraft {
    #[serde(rename = "simulationTurns")]
    turns: Vec<SimulationTurn>,
    #[serde(rename = "finalFileSet")]
    files: Vec<FileDraft>,
}

/// Validate a structured reply against its expected shape.
fn parse_structured<T: DeserializeOwned>(text: &str, feature: &'static str) -> Result<T> {
    serde_json::from_str(extract::json_payload(text)).map_err(|e| {
        tracing::warn!(feature, error = %e, "model reply did not match the declared shape");
        GenerationError::InvalidResponse {
            feature,
            detail: e.to_string(),
        }
    })
}

// ─── Project features ─────────────────────────────────────────────────────

/// Decompose a description into pending tasks with batch ids.
pub async fn generate_tasks(generator: &dyn Generator, description: &str) -> Result<Vec<Task>> {
    let reply = generator
        .generate(GenerationRequest::structured(
            ModelTier::Pro,
            prompts::tasks(description),
            schema::task_list(),
        ))
        .await?;
    let drafts: Vec<TaskDraft> = parse_structured(&reply, "task list")?;
    let batch = Utc::now().timestamp_millis();
    Ok(drafts
        .into_iter()
        .enumerate()
        .map(|(i, d)| Task::new(task::generated_task_id(batch, i), d.title, d.description, d.files))
        .collect())
}

pub async fn generate_boilerplate(
    generator: &dyn Generator,
    task_description: &str,
    file_name: &str,
) -> Result<String> {
    generator
        .generate(GenerationRequest::text(
            ModelTier::Pro,
            prompts::boilerplate(task_description, file_name),
        ))
        .await
}

pub async fn generate_project_scaffold(
    generator: &dyn Generator,
    description: &str,
) -> Result<Vec<GeneratedCode>> {
    let reply = generator
        .generate(GenerationRequest::structured(
            ModelTier::Pro,
            prompts::scaffold(description),
            schema::file_set(),
        ))
        .await?;
    let drafts: Vec<FileDraft> = parse_structured(&reply, "project scaffold")?;
    let files: Vec<GeneratedCode> = drafts.into_iter().map(GeneratedCode::from).collect();
    Ok(code::dedupe(&files))
}

pub async fn continue_conversation(
    generator: &dyn Generator,
    messages: &[ChatMessage],
    project: &Project,
) -> Result<String> {
    generator
        .generate(GenerationRequest::text(
            ModelTier::Pro,
            prompts::conversation(messages, project),
        ))
        .await
}

/// Mermaid source describing the project. Requires generated code.
pub async fn generate_architecture_diagram(
    generator: &dyn Generator,
    project: &Project,
) -> Result<String> {
    if project.generated_code.is_empty() {
        return Err(GenerationError::Precondition(
            "Generate some code for the project before drawing its architecture.".into(),
        ));
    }
    let context = prompts::architecture_context(project);
    let reply = generator
        .generate(GenerationRequest::text(
            ModelTier::Pro,
            prompts::architecture(&context),
        ))
        .await?;
    extract::mermaid(&reply).ok_or_else(|| {
        tracing::warn!(project_id = %project.id, "no Mermaid diagram in model reply");
        GenerationError::NoDiagram
    })
}

pub async fn run_agent_simulation(
    generator: &dyn Generator,
    goal: &str,
    existing: &[GeneratedCode],
) -> Result<SimulationResult> {
    let reply = generator
        .generate(GenerationRequest::structured(
            ModelTier::Pro,
            prompts::simulation(goal, existing),
            schema::simulation(),
        ))
        .await?;
    let draft: SimulationDraft = parse_structured(&reply, "agent simulation")?;
    Ok(SimulationResult {
        turns: draft.turns,
        files: code::dedupe(
            &draft
                .files
                .into_iter()
                .map(GeneratedCode::from)
                .collect::<Vec<_>>(),
        ),
    })
}

// ─── Standalone tools ─────────────────────────────────────────────────────

pub async fn review_code(generator: &dyn Generator, code: &str) -> Result<String> {
    run_tool(generator, Tool::Review, code, None).await
}

pub async fn generate_unit_tests(generator: &dyn Generator, code: &str) -> Result<String> {
    run_tool(generator, Tool::Tests, code, None).await
}

pub async fn generate_documentation(generator: &dyn Generator, code: &str) -> Result<String> {
    run_tool(generator, Tool::Docs, code, None).await
}

pub async fn analyze_complexity(generator: &dyn Generator, code: &str) -> Result<String> {
    run_tool(generator, Tool::Complexity, code, None).await
}

pub async fn summarize_commit(generator: &dyn Generator, diff: &str) -> Result<String> {
    run_tool(generator, Tool::Commit, diff, None).await
}

pub async fn run_and_review(generator: &dyn Generator, code: &str, language: &str) -> Result<String> {
    run_tool(generator, Tool::RunReview, code, Some(language)).await
}

/// Run one of the single-input tools. `language` only matters for
/// [`Tool::RunReview`] and defaults to `javascript`.
pub async fn run_tool(
    generator: &dyn Generator,
    tool: Tool,
    input: &str,
    language: Option<&str>,
) -> Result<String> {
    let prompt = match tool {
        Tool::Review => prompts::review(input),
        Tool::Tests => prompts::unit_tests(input),
        Tool::Docs => prompts::documentation(input),
        Tool::Complexity => prompts::complexity(input),
        Tool::Commit => prompts::commit(input),
        Tool::RunReview => prompts::run_and_review(input, language.unwrap_or("javascript")),
    };
    let reply = generator
        .generate(GenerationRequest::text(tool.tier(), prompt))
        .await?;
    Ok(match tool {
        Tool::Tests => extract::code_block(&reply),
        _ => reply,
    })
}

/// One turn of the ephemeral memory chat.
pub async fn ask_memory_agent(
    generator: &dyn Generator,
    messages: &[ChatMessage],
    input: &str,
) -> Result<String> {
    generator
        .generate(GenerationRequest::text(
            ModelTier::Flash,
            prompts::memory(messages, input),
        ))
        .await
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use devflow_core::types::TaskStatus;
    use std::sync::Mutex;

    /// Replays one canned reply and records the requests it saw.
    struct Canned {
        reply: std::result::Result<String, ()>,
        seen: Mutex<Vec<GenerationRequest>>,
    }

    impl Canned {
        fn ok(reply: &str) -> Self {
            Self {
                reply: Ok(reply.into()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err(()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn last(&self) -> GenerationRequest {
            self.seen.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl Generator for Canned {
        async fn generate(&self, request: GenerationRequest) -> Result<String> {
            self.seen.lock().unwrap().push(request);
            self.reply
                .clone()
                .map_err(|_| GenerationError::Transport("offline".into()))
        }
    }

    #[tokio::test]
    async fn tasks_get_batch_ids_and_pending_status() {
        let g = Canned::ok(
            r#"[{"title":"API","description":"Build the API","files":["api.rs"]},
                {"title":"UI","description":"Build the UI","files":[]}]"#,
        );
        let tasks = generate_tasks(&g, "a todo app").await.unwrap();
        assert_eq!(tasks.len(), 2);
        assert!(tasks[0].id.starts_with("task-") && tasks[0].id.ends_with("-0"));
        assert!(tasks[1].id.ends_with("-1"));
        assert!(tasks.iter().all(|t| t.status == TaskStatus::Pending));
        assert_eq!(tasks[0].files, vec!["api.rs".to_string()]);

        let req = g.last();
        assert_eq!(req.tier, ModelTier::Pro);
        assert!(req.schema.is_some());
    }

    #[tokio::test]
    async fn malformed_structured_reply_is_invalid_response() {
        let g = Canned::ok("Sure! Here are your tasks: ...");
        let err = generate_tasks(&g, "x").await.unwrap_err();
        assert!(matches!(
            err,
            GenerationError::InvalidResponse { feature: "task list", .. }
        ));
    }

    #[tokio::test]
    async fn fenced_json_is_tolerated() {
        let g = Canned::ok("```json\n[{\"fileName\":\"README.md\",\"content\":\"# Hi\"}]\n```");
        let files = generate_project_scaffold(&g, "site").await.unwrap();
        assert_eq!(files, vec![GeneratedCode::new("README.md", "# Hi")]);
    }

    #[tokio::test]
    async fn scaffold_collapses_repeated_paths() {
        let g = Canned::ok(
            r#"[{"fileName":"a.txt","content":"1"},{"fileName":"./a.txt","content":"2"}]"#,
        );
        let files = generate_project_scaffold(&g, "site").await.unwrap();
        assert_eq!(files, vec![GeneratedCode::new("a.txt", "2")]);
    }

    #[tokio::test]
    async fn transport_failure_propagates() {
        let g = Canned::failing();
        let err = review_code(&g, "fn main() {}").await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn unit_tests_strip_code_fence() {
        let g = Canned::ok("```python\ndef test_add():\n    assert add(1, 2) == 3\n```");
        let out = generate_unit_tests(&g, "def add(a, b): return a + b").await.unwrap();
        assert_eq!(out, "def test_add():\n    assert add(1, 2) == 3");
        assert_eq!(g.last().tier, ModelTier::Pro);
    }

    #[tokio::test]
    async fn review_tools_use_flash() {
        let g = Canned::ok("## Review");
        for tool in [Tool::Review, Tool::Docs, Tool::Complexity, Tool::Commit, Tool::RunReview] {
            let out = run_tool(&g, tool, "x", Some("rust")).await.unwrap();
            assert_eq!(out, "## Review");
            assert_eq!(g.last().tier, ModelTier::Flash);
        }
        assert!(g.last().prompt.contains("```rust"));
    }

    #[tokio::test]
    async fn architecture_requires_generated_code() {
        let g = Canned::ok("```mermaid\ngraph TD\nA-->B\n```");
        let mut project = Project::new("p1", "Demo", "demo");
        let err = generate_architecture_diagram(&g, &project).await.unwrap_err();
        assert!(matches!(err, GenerationError::Precondition(_)));

        project.generated_code.push(GeneratedCode::new("app.js", "x"));
        let diagram = generate_architecture_diagram(&g, &project).await.unwrap();
        assert_eq!(diagram, "graph TD\nA-->B");
    }

    #[tokio::test]
    async fn architecture_without_diagram_fails() {
        let g = Canned::ok("I am unable to help with that.");
        let mut project = Project::new("p1", "Demo", "demo");
        project.generated_code.push(GeneratedCode::new("app.js", "x"));
        let err = generate_architecture_diagram(&g, &project).await.unwrap_err();
        assert!(matches!(err, GenerationError::NoDiagram));
    }

    #[tokio::test]
    async fn simulation_maps_turns_and_files() {
        let g = Canned::ok(
            r#"{"simulationTurns":[{"agent":"Project Manager","message":"Plan"}],
                "finalFileSet":[{"fileName":"src/App.js","content":"app"}]}"#,
        );
        let result = run_agent_simulation(&g, "build it", &[]).await.unwrap();
        assert_eq!(result.turns[0].agent, "Project Manager");
        assert_eq!(result.files, vec![GeneratedCode::new("src/App.js", "app")]);
    }

    #[tokio::test]
    async fn simulation_missing_key_is_invalid() {
        let g = Canned::ok(r#"{"simulationTurns":[]}"#);
        let err = run_agent_simulation(&g, "x", &[]).await.unwrap_err();
        assert!(matches!(err, GenerationError::InvalidResponse { .. }));
    }

    #[tokio::test]
    async fn memory_agent_uses_flash() {
        let g = Canned::ok("You said hi.");
        let out = ask_memory_agent(&g, &[ChatMessage::user("hi")], "what did I say?")
            .await
            .unwrap();
        assert_eq!(out, "You said hi.");
        assert_eq!(g.last().tier, ModelTier::Flash);
    }
}
