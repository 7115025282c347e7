use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const DEVFLOW_DIR: &str = ".devflow";
pub const CONFIG_FILE: &str = ".devflow/config.yaml";
pub const DATABASE_FILE: &str = ".devflow/devflow.redb";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn devflow_dir(root: &Path) -> PathBuf {
    root.join(DEVFLOW_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn database_path(root: &Path) -> PathBuf {
    root.join(DATABASE_FILE)
}

// ---------------------------------------------------------------------------
// Generated file paths
// ---------------------------------------------------------------------------

/// Normalize a declared file path for lookups: strips leading `./` and `/`.
///
/// `"/img/logo.png"`, `"./img/logo.png"` and `"img/logo.png"` all become
/// `"img/logo.png"`.
pub fn normalize_file_path(path: &str) -> &str {
    let mut p = path.trim();
    loop {
        if let Some(rest) = p.strip_prefix("./") {
            p = rest;
        } else if let Some(rest) = p.strip_prefix('/') {
            p = rest;
        } else {
            return p;
        }
    }
}

/// Lowercased extension of a path, without the dot.
pub fn extension(path: &str) -> Option<String> {
    let name = path.rsplit('/').next().unwrap_or(path);
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() && ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
