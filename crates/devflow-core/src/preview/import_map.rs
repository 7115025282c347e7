use super::media::SCRIPT_EXTENSIONS;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A browser import map: module specifier -> resource address.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportMap {
    pub imports: BTreeMap<String, String>,
}

impl ImportMap {
    /// Register a script at root-relative `path` (no leading slash).
    ///
    /// Adds `/path`, the extension-less `/path` when the extension is a
    /// script extension, and the directory form when the stripped path ends
    /// in `/index`. `src/index.js` therefore answers to `/src/index.js`,
    /// `/src/index` and `/src`.
    pub fn register_script(&mut self, path: &str, address: &str) {
        let absolute = format!("/{path}");
        self.imports.insert(absolute.clone(), address.to_string());

        let Some(stripped) = strip_script_extension(&absolute) else {
            return;
        };
        self.imports.insert(stripped.to_string(), address.to_string());

        if let Some(dir) = stripped.strip_suffix("/index") {
            if !dir.is_empty() {
                self.imports.insert(dir.to_string(), address.to_string());
            }
        }
    }

    pub fn get(&self, specifier: &str) -> Option<&str> {
        self.imports.get(specifier).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.imports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.imports.is_empty()
    }

    /// Pretty JSON safe to embed in a `<script>` element.
    pub fn to_script_json(&self) -> serde_json::Result<String> {
        Ok(serde_json::to_string_pretty(self)?.replace("</", "<\\/"))
    }
}

fn strip_script_extension(path: &str) -> Option<&str> {
    let (stem, ext) = path.rsplit_once('.')?;
    if stem.ends_with('/') || stem.is_empty() {
        return None;
    }
    // Match case-sensitively, as module specifiers are.
    SCRIPT_EXTENSIONS.contains(&ext).then_some(stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_full_and_stripped_paths() {
        let mut map = ImportMap::default();
        map.register_script("src/utils.js", "/preview/a");
        assert_eq!(map.get("/src/utils.js"), Some("/preview/a"));
        assert_eq!(map.get("/src/utils"), Some("/preview/a"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn index_registers_directory() {
        let mut map = ImportMap::default();
        map.register_script("src/index.js", "/preview/b");
        assert_eq!(map.get("/src/index.js"), Some("/preview/b"));
        assert_eq!(map.get("/src/index"), Some("/preview/b"));
        assert_eq!(map.get("/src"), Some("/preview/b"));
    }

    #[test]
    fn root_index_has_no_directory_form() {
        let mut map = ImportMap::default();
        map.register_script("index.tsx", "/preview/c");
        assert_eq!(map.get("/index"), Some("/preview/c"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn unrecognized_extension_only_full_path() {
        let mut map = ImportMap::default();
        map.register_script("lib/module.mjs", "/preview/d");
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn script_json_escapes_closing_tags() {
        let mut map = ImportMap::default();
        map.register_script("a.js", "/x</script>");
        let json = map.to_script_json().unwrap();
        assert!(!json.contains("</script>"));
        assert!(json.contains("\"imports\""));
    }
}
