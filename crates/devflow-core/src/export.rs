use crate::code::{self, GeneratedCode};
use crate::error::{DevflowError, Result};
use crate::paths;
use regex::Regex;
use std::io::{Cursor, Write};
use std::sync::OnceLock;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const DEFAULT_ARCHIVE_STEM: &str = "devflow_project";

fn non_word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_]+").expect("valid regex"))
}

/// Download name for a project's archive: runs of non-word characters become
/// `_`, falling back to `devflow_project` when nothing is left.
pub fn archive_name(project_name: &str) -> String {
    let stem = non_word_re().replace_all(project_name, "_");
    if stem.is_empty() || stem == "_" {
        format!("{DEFAULT_ARCHIVE_STEM}.zip")
    } else {
        format!("{stem}.zip")
    }
}

/// Package the generated files into a deflate zip, one entry per path.
pub fn zip_files(files: &[GeneratedCode]) -> Result<Vec<u8>> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for file in code::dedupe(files) {
        let name = paths::normalize_file_path(&file.path);
        if name.is_empty() {
            tracing::warn!(path = %file.path, "skipping archive entry with empty path");
            continue;
        }
        writer
            .start_file(name, options)
            .map_err(|e| DevflowError::Archive(e.to_string()))?;
        writer.write_all(file.content.as_bytes())?;
    }

    let cursor = writer
        .finish()
        .map_err(|e| DevflowError::Archive(e.to_string()))?;
    Ok(cursor.into_inner())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    #[test]
    fn archive_name_sanitizes() {
        assert_eq!(archive_name("My Todo App"), "My_Todo_App.zip");
        assert_eq!(archive_name("a -- b!"), "a_b_.zip");
        assert_eq!(archive_name(""), "devflow_project.zip");
        assert_eq!(archive_name("!!!"), "devflow_project.zip");
    }

    #[test]
    fn zip_preserves_paths_and_content() {
        let files = vec![
            GeneratedCode::new("index.html", "<html></html>"),
            GeneratedCode::new("src/components/App.jsx", "export default 1;"),
            GeneratedCode::new("index.html", "<html>v2</html>"),
        ];
        let bytes = zip_files(&files).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);

        let mut content = String::new();
        archive
            .by_name("src/components/App.jsx")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "export default 1;");

        content.clear();
        archive
            .by_name("index.html")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "<html>v2</html>");
    }

    #[test]
    fn zip_strips_leading_slash() {
        let bytes = zip_files(&[GeneratedCode::new("/app.js", "x")]).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert!(archive.by_name("app.js").is_ok());
    }

    #[test]
    fn zip_collapses_equivalent_paths() {
        let files = vec![
            GeneratedCode::new("a.txt", "1"),
            GeneratedCode::new("./a.txt", "2"),
            GeneratedCode::new("/a.txt", "3"),
        ];
        let bytes = zip_files(&files).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 1);

        let mut content = String::new();
        archive
            .by_name("a.txt")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "3");
    }
}
