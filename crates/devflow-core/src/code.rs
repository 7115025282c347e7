use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::paths::normalize_file_path;

/// One generated file. Paths may contain `/` and are unique within a project
/// once normalized (`./a.txt`, `/a.txt` and `a.txt` name the same file).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedCode {
    pub path: String,
    pub content: String,
}

impl GeneratedCode {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Override-by-path operations
// ---------------------------------------------------------------------------

/// Replace the entry at `path` in place, or append a new one.
/// Returns `true` if an existing entry was replaced.
pub fn upsert(files: &mut Vec<GeneratedCode>, path: &str, content: impl Into<String>) -> bool {
    let path = normalize_file_path(path);
    let content = content.into();
    match files
        .iter_mut()
        .find(|f| normalize_file_path(&f.path) == path)
    {
        Some(existing) => {
            existing.path = path.to_string();
            existing.content = content;
            true
        }
        None => {
            files.push(GeneratedCode::new(path, content));
            false
        }
    }
}

/// Merge `incoming` into `existing` by normalized path: a later entry
/// supersedes an earlier one with the same path. Each path keeps the position
/// of its first appearance; new paths are appended in incoming order. Merged
/// entries are stored under their normalized path.
pub fn merge(existing: &mut Vec<GeneratedCode>, incoming: impl IntoIterator<Item = GeneratedCode>) {
    let mut index: HashMap<String, usize> = existing
        .iter()
        .enumerate()
        .map(|(i, f)| (normalize_file_path(&f.path).to_string(), i))
        .collect();

    for file in incoming {
        let path = normalize_file_path(&file.path).to_string();
        match index.get(&path) {
            Some(&i) => {
                existing[i].path = path;
                existing[i].content = file.content;
            }
            None => {
                index.insert(path.clone(), existing.len());
                existing.push(GeneratedCode::new(path, file.content));
            }
        }
    }
}

/// Collapse duplicate paths in a list, later entries winning.
pub fn dedupe(files: &[GeneratedCode]) -> Vec<GeneratedCode> {
    let mut out = Vec::with_capacity(files.len());
    merge(&mut out, files.iter().cloned());
    out
}

pub fn find<'a>(files: &'a [GeneratedCode], path: &str) -> Option<&'a GeneratedCode> {
    let path = normalize_file_path(path);
    files.iter().find(|f| normalize_file_path(&f.path) == path)
}

// ---------------------------------------------------------------------------
// File tree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FileTreeNode {
    File { path: String },
    Dir { children: BTreeMap<String, FileTreeNode> },
}

/// Build a nested tree from the `/`-separated paths, children sorted by name.
pub fn file_tree(files: &[GeneratedCode]) -> BTreeMap<String, FileTreeNode> {
    let mut paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
    paths.sort_unstable();

    let mut root: BTreeMap<String, FileTreeNode> = BTreeMap::new();
    for path in paths {
        let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
        let Some((leaf, dirs)) = parts.split_last() else {
            continue;
        };
        let mut level = &mut root;
        for dir in dirs {
            let node = level
                .entry((*dir).to_string())
                .or_insert_with(|| FileTreeNode::Dir {
                    children: BTreeMap::new(),
                });
            // A file and a directory sharing a name: the directory wins.
            if let FileTreeNode::File { .. } = node {
                *node = FileTreeNode::Dir {
                    children: BTreeMap::new(),
                };
            }
            level = match node {
                FileTreeNode::Dir { children } => children,
                FileTreeNode::File { .. } => unreachable!("replaced with a directory above"),
            };
        }
        level
            .entry((*leaf).to_string())
            .or_insert_with(|| FileTreeNode::File {
                path: path.to_string(),
            });
    }
    root
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_later_entry_wins() {
        let mut files = Vec::new();
        merge(
            &mut files,
            vec![GeneratedCode::new("a.txt", "1"), GeneratedCode::new("a.txt", "2")],
        );
        assert_eq!(files, vec![GeneratedCode::new("a.txt", "2")]);
    }

    #[test]
    fn merge_keeps_positions_and_appends_new() {
        let mut files = vec![
            GeneratedCode::new("index.html", "<html>"),
            GeneratedCode::new("app.js", "old"),
        ];
        merge(
            &mut files,
            vec![
                GeneratedCode::new("style.css", "body{}"),
                GeneratedCode::new("app.js", "new"),
            ],
        );
        let paths: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["index.html", "app.js", "style.css"]);
        assert_eq!(files[1].content, "new");
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut files = vec![GeneratedCode::new("a.js", "1"), GeneratedCode::new("b.js", "2")];
        assert!(upsert(&mut files, "a.js", "3"));
        assert!(!upsert(&mut files, "c.js", "4"));
        assert_eq!(files[0].content, "3");
        assert_eq!(files.len(), 3);
    }

    #[test]
    fn dedupe_collapses_duplicates() {
        let files = vec![
            GeneratedCode::new("x", "1"),
            GeneratedCode::new("y", "2"),
            GeneratedCode::new("x", "3"),
        ];
        let out = dedupe(&files);
        assert_eq!(out.len(), 2);
        assert_eq!(find(&out, "x").unwrap().content, "3");
    }

    #[test]
    fn merge_treats_prefixed_paths_as_one_file() {
        let mut files = vec![GeneratedCode::new("a.txt", "1")];
        merge(
            &mut files,
            vec![
                GeneratedCode::new("./a.txt", "2"),
                GeneratedCode::new("/src/app.js", "x"),
                GeneratedCode::new("src/app.js", "y"),
            ],
        );
        assert_eq!(
            files,
            vec![GeneratedCode::new("a.txt", "2"), GeneratedCode::new("src/app.js", "y")]
        );
    }

    #[test]
    fn upsert_and_find_normalize_paths() {
        let mut files = vec![GeneratedCode::new("/index.html", "old")];
        assert!(upsert(&mut files, "./index.html", "new"));
        assert_eq!(files, vec![GeneratedCode::new("index.html", "new")]);
        assert_eq!(find(&files, "/index.html").unwrap().content, "new");
    }

    #[test]
    fn file_tree_nests_directories() {
        let files = vec![
            GeneratedCode::new("src/components/Button.js", ""),
            GeneratedCode::new("README.md", ""),
            GeneratedCode::new("src/index.js", ""),
        ];
        let tree = file_tree(&files);
        assert_eq!(tree.keys().collect::<Vec<_>>(), vec!["README.md", "src"]);
        let FileTreeNode::Dir { children } = &tree["src"] else {
            panic!("src should be a directory");
        };
        assert!(matches!(children["index.js"], FileTreeNode::File { ref path } if path == "src/index.js"));
        assert!(matches!(children["components"], FileTreeNode::Dir { .. }));
    }
}
