use crate::error::{DevflowError, Result};
use crate::project::Project;
use crate::types::TaskStatus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub files: Vec<String>,
    pub status: TaskStatus,
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        files: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            files,
            status: TaskStatus::Pending,
        }
    }
}

/// Id for the `index`-th task of a decomposition batch, e.g. `task-1718000000000-0`.
pub fn generated_task_id(batch_millis: i64, index: usize) -> String {
    format!("task-{batch_millis}-{index}")
}

// ---------------------------------------------------------------------------
// Board operations (operate on a mutable Vec<Task>)
// ---------------------------------------------------------------------------

/// Append freshly decomposed tasks after the existing ones.
pub fn append_tasks(tasks: &mut Vec<Task>, generated: Vec<Task>) {
    tasks.extend(generated);
}

/// Move a task to `status`. Returns `false` when the task already has that
/// status, in which case nothing changes.
pub fn move_task(tasks: &mut [Task], id: &str, status: TaskStatus) -> Result<bool> {
    let task = find_mut(tasks, id)?;
    if task.status == status {
        return Ok(false);
    }
    task.status = status;
    Ok(true)
}

pub fn delete_task(tasks: &mut Vec<Task>, id: &str) -> Result<Task> {
    let pos = tasks
        .iter()
        .position(|t| t.id == id)
        .ok_or_else(|| DevflowError::TaskNotFound(id.to_string()))?;
    Ok(tasks.remove(pos))
}

pub fn find<'a>(tasks: &'a [Task], id: &str) -> Result<&'a Task> {
    tasks
        .iter()
        .find(|t| t.id == id)
        .ok_or_else(|| DevflowError::TaskNotFound(id.to_string()))
}

fn find_mut<'a>(tasks: &'a mut [Task], id: &str) -> Result<&'a mut Task> {
    tasks
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or_else(|| DevflowError::TaskNotFound(id.to_string()))
}

// ---------------------------------------------------------------------------
// Board view
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct Column<'a> {
    pub status: TaskStatus,
    pub title: &'static str,
    pub tasks: Vec<&'a Task>,
}

/// Split tasks into the three board columns, keeping project order within each.
pub fn board(tasks: &[Task]) -> Vec<Column<'_>> {
    TaskStatus::all()
        .iter()
        .map(|&status| Column {
            status,
            title: status.title(),
            tasks: tasks.iter().filter(|t| t.status == status).collect(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Dashboard statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectStats {
    pub total_tasks: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub done: usize,
    pub completion_percent: u32,
    pub generated_files: usize,
    pub chat_messages: usize,
    pub heatmap: Vec<HeatCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatCell {
    pub task_id: String,
    pub title: String,
    pub files: usize,
    /// 0 (no files) to 4 (at least 75% of the busiest task).
    pub level: u8,
}

pub fn stats(project: &Project) -> ProjectStats {
    let count = |s: TaskStatus| project.tasks.iter().filter(|t| t.status == s).count();
    let total = project.tasks.len();
    let done = count(TaskStatus::Done);
    let completion_percent = if total == 0 {
        0
    } else {
        ((done as f64 / total as f64) * 100.0).round() as u32
    };

    let max_files = project.tasks.iter().map(|t| t.files.len()).max().unwrap_or(0);
    let heatmap = project
        .tasks
        .iter()
        .map(|t| HeatCell {
            task_id: t.id.clone(),
            title: t.title.clone(),
            files: t.files.len(),
            level: heat_level(t.files.len(), max_files),
        })
        .collect();

    ProjectStats {
        total_tasks: total,
        pending: count(TaskStatus::Pending),
        in_progress: count(TaskStatus::InProgress),
        done,
        completion_percent,
        generated_files: project.generated_code.len(),
        chat_messages: project.messages.len(),
        heatmap,
    }
}

pub fn heat_level(files: usize, max_files: usize) -> u8 {
    if max_files == 0 || files == 0 {
        return 0;
    }
    let intensity = files as f64 / max_files as f64;
    if intensity > 0.75 {
        4
    } else if intensity > 0.5 {
        3
    } else if intensity > 0.25 {
        2
    } else {
        1
    }
}

/// Human-readable summary: "2/5 done, 1 in progress, 2 pending"
pub fn summarize(tasks: &[Task]) -> String {
    let count = |s: TaskStatus| tasks.iter().filter(|t| t.status == s).count();
    format!(
        "{}/{} done, {} in progress, {} pending",
        count(TaskStatus::Done),
        tasks.len(),
        count(TaskStatus::InProgress),
        count(TaskStatus::Pending)
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Task> {
        vec![
            Task::new("t1", "Schema", "Design the schema", vec!["db.sql".into()]),
            Task::new("t2", "API", "Build the API", vec!["api.rs".into(), "routes.rs".into()]),
            Task::new("t3", "UI", "Build the UI", vec![]),
        ]
    }

    #[test]
    fn move_task_changes_status() {
        let mut tasks = sample();
        assert!(move_task(&mut tasks, "t2", TaskStatus::InProgress).unwrap());
        assert_eq!(tasks[1].status, TaskStatus::InProgress);
    }

    #[test]
    fn move_to_current_status_is_noop() {
        let mut tasks = sample();
        move_task(&mut tasks, "t3", TaskStatus::Done).unwrap();
        let before = tasks.clone();
        assert!(!move_task(&mut tasks, "t1", TaskStatus::Pending).unwrap());
        assert_eq!(tasks, before);
        let done: Vec<_> = board(&tasks)[2].tasks.iter().map(|t| t.id.clone()).collect();
        assert_eq!(done, vec!["t3"]);
    }

    #[test]
    fn move_unknown_task_fails() {
        let mut tasks = sample();
        assert!(matches!(
            move_task(&mut tasks, "nope", TaskStatus::Done),
            Err(DevflowError::TaskNotFound(_))
        ));
    }

    #[test]
    fn delete_task_removes_only_target() {
        let mut tasks = sample();
        let removed = delete_task(&mut tasks, "t2").unwrap();
        assert_eq!(removed.title, "API");
        let ids: Vec<_> = tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t3"]);
        assert!(delete_task(&mut tasks, "t2").is_err());
    }

    #[test]
    fn board_keeps_project_order_per_column() {
        let mut tasks = sample();
        move_task(&mut tasks, "t1", TaskStatus::Done).unwrap();
        move_task(&mut tasks, "t3", TaskStatus::Done).unwrap();
        let columns = board(&tasks);
        assert_eq!(columns.len(), 3);
        assert_eq!(columns[0].tasks.len(), 1);
        let done: Vec<_> = columns[2].tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(done, vec!["t1", "t3"]);
    }

    #[test]
    fn heat_levels_follow_thresholds() {
        assert_eq!(heat_level(0, 4), 0);
        assert_eq!(heat_level(1, 4), 1);
        assert_eq!(heat_level(2, 4), 2);
        assert_eq!(heat_level(3, 4), 3);
        assert_eq!(heat_level(4, 4), 4);
        assert_eq!(heat_level(3, 0), 0);
    }

    #[test]
    fn stats_for_empty_project() {
        let project = Project::new("p1", "Empty", "nothing yet");
        let s = stats(&project);
        assert_eq!(s.total_tasks, 0);
        assert_eq!(s.completion_percent, 0);
        assert!(s.heatmap.is_empty());
    }

    #[test]
    fn stats_rounds_completion() {
        let mut project = Project::new("p1", "Demo", "demo");
        project.tasks = sample();
        move_task(&mut project.tasks, "t1", TaskStatus::Done).unwrap();
        let s = stats(&project);
        assert_eq!(s.done, 1);
        assert_eq!(s.completion_percent, 33);
        assert_eq!(s.heatmap[1].level, 4);
        assert_eq!(summarize(&project.tasks), "1/3 done, 0 in progress, 2 pending");
    }

    #[test]
    fn generated_ids_are_indexed() {
        assert_eq!(generated_task_id(42, 3), "task-42-3");
    }
}
