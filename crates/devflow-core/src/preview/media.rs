use crate::paths;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Media type of a preview resource, decided purely by path extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Html,
    Css,
    Script,
    Json,
    Png,
    Jpeg,
    Svg,
    Binary,
}

/// Extensions that mark a file as script source.
pub const SCRIPT_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx"];

/// Extensions that mark a file as component-syntax source.
pub const COMPONENT_EXTENSIONS: &[&str] = &["jsx", "tsx"];

impl MediaType {
    pub fn from_path(path: &str) -> Self {
        match paths::extension(path).as_deref() {
            Some("html") => MediaType::Html,
            Some("css") => MediaType::Css,
            Some("js" | "jsx" | "ts" | "tsx") => MediaType::Script,
            Some("json") => MediaType::Json,
            Some("png") => MediaType::Png,
            Some("jpg" | "jpeg") => MediaType::Jpeg,
            Some("svg") => MediaType::Svg,
            _ => MediaType::Binary,
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            MediaType::Html => "text/html",
            MediaType::Css => "text/css",
            MediaType::Script => "text/javascript",
            MediaType::Json => "application/json",
            MediaType::Png => "image/png",
            MediaType::Jpeg => "image/jpeg",
            MediaType::Svg => "image/svg+xml",
            MediaType::Binary => "application/octet-stream",
        }
    }

    pub fn is_script(self) -> bool {
        self == MediaType::Script
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// True if the path carries a `.jsx` or `.tsx` extension.
pub fn is_component_source(path: &str) -> bool {
    paths::extension(path).is_some_and(|ext| COMPONENT_EXTENSIONS.contains(&ext.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_extension() {
        assert_eq!(MediaType::from_path("styles/site.css"), MediaType::Css);
        assert_eq!(MediaType::from_path("src/App.TSX"), MediaType::Script);
        assert_eq!(MediaType::from_path("img/photo.jpeg"), MediaType::Jpeg);
        assert_eq!(MediaType::from_path("img/photo.jpg").mime(), "image/jpeg");
        assert_eq!(MediaType::from_path("logo.svg").mime(), "image/svg+xml");
        assert_eq!(MediaType::from_path("LICENSE"), MediaType::Binary);
        assert_eq!(
            MediaType::from_path("notes.md").mime(),
            "application/octet-stream"
        );
    }

    #[test]
    fn component_source_detection() {
        assert!(is_component_source("src/App.jsx"));
        assert!(is_component_source("Main.TSX"));
        assert!(!is_component_source("src/app.js"));
    }
}
