//! Prompt builders, one per feature. Pure string construction.

use devflow_core::chat::{self, ChatMessage};
use devflow_core::code::GeneratedCode;
use devflow_core::project::Project;
use devflow_core::types::TaskStatus;

fn fenced(lang: &str, body: &str) -> String {
    format!("```{lang}\n{body}\n```")
}

pub fn tasks(description: &str) -> String {
    format!(
        "Break the project described below into a list of development tasks.\n\
         Give every task a title, a detailed description, and the names of the files \
         it will most likely create or modify.\n\
         Answer with a JSON array of objects with \"title\", \"description\" and \"files\" \
         properties and nothing else: no prose, no markdown.\n\n\
         Project description: \"{description}\""
    )
}

pub fn boilerplate(task_description: &str, file_name: &str) -> String {
    format!(
        "Task: \"{task_description}\"\n\
         File: \"{file_name}\"\n\n\
         Write the complete initial code for this file so that it starts the task above.\n\
         Output only the raw code, with no explanation, markdown or code fences."
    )
}

pub fn review(code: &str) -> String {
    format!(
        "Review the following code as an experienced reviewer. Cover:\n\
         - likely bugs and unhandled edge cases\n\
         - readability and style\n\
         - performance\n\
         - recommended practices\n\n\
         Write the review in Markdown.\n\n{}",
        fenced("", code)
    )
}

pub fn unit_tests(code: &str) -> String {
    format!(
        "Write thorough unit tests for the code below, including edge cases.\n\
         Work out its language and use the usual test framework for it \
         (Jest for JavaScript/TypeScript, pytest for Python, and so on).\n\
         Output only the test file, wrapped in a single code block, with no explanation.\n\n{}",
        fenced("", code)
    )
}

pub fn documentation(code: &str) -> String {
    format!(
        "Write technical documentation in Markdown for the code below.\n\
         Describe what it does, its parameters and return values, and add a short usage example.\n\n{}",
        fenced("", code)
    )
}

pub fn complexity(code: &str) -> String {
    format!(
        "Determine the time and space complexity of the code below.\n\
         State both in Big O notation and explain the reasoning so a developer can follow it.\n\
         Use Markdown.\n\n{}",
        fenced("", code)
    )
}

pub fn commit(diff: &str) -> String {
    format!(
        "Write a conventional commit message for this git diff: a type such as feat, fix \
         or chore, a short summary line, and an optional body describing the changes.\n\n{}",
        fenced("diff", diff)
    )
}

pub fn scaffold(description: &str) -> String {
    format!(
        "Produce a complete project scaffold for the description below: a directory \
         structure plus the full contents of every file.\n\
         Always include a README.md with step-by-step instructions for installing \
         dependencies and running the project locally.\n\
         Answer with a single JSON array of objects, each with two string properties: \
         \"fileName\" (the full path, for example \"src/components/Button.js\") and \
         \"content\" (the whole file). Output the JSON array only.\n\n\
         Project description: \"{description}\""
    )
}

pub fn run_and_review(code: &str, language: &str) -> String {
    format!(
        "Act as a code execution sandbox. You cannot run the {language} code below, so simulate it:\n\
         1. Check it for correctness and errors.\n\
         2. Predict the output it would print. If it prints nothing, describe what it accomplishes.\n\
         3. Briefly assess its quality.\n\n\
         Answer in Markdown with a \"Predicted Output\" section and a \"Code Review\" section.\n\n{}",
        fenced(language, code)
    )
}

/// Project summary used as chat context.
pub fn project_context(project: &Project) -> String {
    let done = project
        .tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Done)
        .count();
    let mut out = format!(
        "Current project: \"{}\"\nDescription: \"{}\"\nTasks ({}/{} done):",
        project.name,
        project.description,
        done,
        project.tasks.len()
    );
    for task in &project.tasks {
        out.push_str(&format!("\n- {} (status: {})", task.title, task.status));
    }
    out
}

pub fn conversation(messages: &[ChatMessage], project: &Project) -> String {
    format!(
        "You are DevFlow.AI, an assistant built into a developer workflow tool. \
         You know the current project and the conversation so far. \
         Be concise, accurate and practical.\n\n\
         --- Project ---\n{}\n\n\
         --- Conversation ---\n{}\n\n\
         ---\nReply to the last user message.",
        project_context(project),
        chat::transcript(messages)
    )
}

/// Description plus every generated file, as fed to the diagram prompt.
pub fn architecture_context(project: &Project) -> String {
    let files = project
        .generated_code
        .iter()
        .map(|f| format!("// File: {}\n{}", f.path, f.content))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n");
    format!(
        "Project: {}\nDescription: {}\n\nFiles:\n{}",
        project.name, project.description, files
    )
}

pub fn architecture(context: &str) -> String {
    format!(
        "From the project context below (description and all source files), draw a system \
         architecture diagram in Mermaid.js syntax showing the main components and how they relate.\n\
         Output only the Mermaid code block: start with ```mermaid and end with ```.\n\n\
         Project context:\n{context}"
    )
}

pub fn memory(messages: &[ChatMessage], input: &str) -> String {
    let history = chat::transcript(messages);
    let separator = if history.is_empty() { "" } else { "\n" };
    format!(
        "You are an assistant that remembers everything said in this conversation.\n\n\
         --- Conversation ---\n{history}{separator}User: {input}\n---\n\n\
         Answer the last user message using the whole conversation."
    )
}

pub fn simulation(goal: &str, existing: &[GeneratedCode]) -> String {
    let context = if existing.is_empty() {
        "The project has no files yet; the Senior Developer must create everything from scratch."
            .to_string()
    } else {
        let files = existing
            .iter()
            .map(|f| format!("// File: {}\n{}", f.path, f.content))
            .collect::<Vec<_>>()
            .join("\n\n");
        format!("The project already has these files, which may be changed or extended:\n{files}")
    };

    format!(
        "Simulate a team of AI agents building software toward a user's goal.\n\
         The team:\n\
         - Project Manager: plans, splits the goal into tasks and keeps the work on track.\n\
         - Senior Developer: writes and changes the code; code must be complete and correct.\n\
         - QA Engineer: asks clarifying questions, finds edge cases and reviews the code.\n\n\
         Rules:\n\
         1. Agents answer each other in a natural order.\n\
         2. The Project Manager opens with a plan.\n\
         3. Only the Senior Developer writes code, and always gives a file's entire content.\n\
         4. The Project Manager closes with a summary.\n\
         5. The final answer is one JSON object and nothing else.\n\
         6. The object has two keys: \"simulationTurns\", an array of {{\"agent\", \"message\"}} \
            objects in conversation order, and \"finalFileSet\", an array of {{\"fileName\", \"content\"}} \
            objects giving the final full content of every new or changed file.\n\n\
         Existing project:\n{context}\n\n\
         Goal: \"{goal}\""
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use devflow_core::task::Task;

    fn project() -> Project {
        let mut p = Project::new("p1", "Todo", "A todo app");
        let mut done = Task::new("t1", "Schema", "d", vec![]);
        done.status = TaskStatus::Done;
        p.tasks = vec![done, Task::new("t2", "UI", "d", vec![])];
        p.generated_code = vec![
            GeneratedCode::new("index.html", "<html></html>"),
            GeneratedCode::new("app.js", "run()"),
        ];
        p
    }

    #[test]
    fn project_context_lists_tasks() {
        let ctx = project_context(&project());
        assert!(ctx.contains("\"Todo\""));
        assert!(ctx.contains("Tasks (1/2 done):"));
        assert!(ctx.contains("- Schema (status: done)"));
        assert!(ctx.contains("- UI (status: pending)"));
    }

    #[test]
    fn conversation_includes_transcript() {
        let prompt = conversation(&[ChatMessage::user("What next?")], &project());
        assert!(prompt.contains("User: What next?"));
        assert!(prompt.contains("DevFlow.AI"));
    }

    #[test]
    fn architecture_context_separates_files() {
        let ctx = architecture_context(&project());
        assert!(ctx.contains("// File: index.html\n<html></html>"));
        assert!(ctx.contains("\n\n---\n\n// File: app.js"));
    }

    #[test]
    fn memory_appends_current_input() {
        assert!(memory(&[], "hi").contains("--- Conversation ---\nUser: hi\n"));
        let prompt = memory(&[ChatMessage::user("a"), ChatMessage::ai("b")], "c");
        assert!(prompt.contains("User: a\nModel: b\nUser: c"));
    }

    #[test]
    fn simulation_mentions_existing_files() {
        assert!(simulation("build", &[]).contains("no files yet"));
        let p = simulation("build", &[GeneratedCode::new("a.js", "x")]);
        assert!(p.contains("// File: a.js\nx"));
        assert!(p.contains("\"finalFileSet\""));
    }

    #[test]
    fn run_and_review_fences_with_language() {
        let p = run_and_review("print(1)", "python");
        assert!(p.contains("```python\nprint(1)\n```"));
        assert!(p.contains("Predicted Output"));
    }
}
