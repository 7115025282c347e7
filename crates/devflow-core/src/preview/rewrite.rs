//! Entry-document rewriting, built on `lol_html`.
//!
//! Rewriting is two streaming passes over the markup. The scan pass collects
//! facts the rewrite pass needs before it sees the element they apply to:
//! each inline script's text and whether `<head>`/`<html>` exist. The rewrite
//! pass then maps local references to resource addresses, marks component
//! scripts for the transpiler and injects the import map.

use lol_html::html_content::ContentType;
use lol_html::{element, rewrite_str, text, RewriteStrSettings};
use regex::Regex;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::sync::OnceLock;

use super::import_map::ImportMap;
use super::media::is_component_source;
use crate::error::{DevflowError, Result};
use crate::paths;

static SCHEME_RE: OnceLock<Regex> = OnceLock::new();
static MARKUP_RE: OnceLock<Regex> = OnceLock::new();

fn scheme_re() -> &'static Regex {
    SCHEME_RE.get_or_init(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.\-]*:").unwrap())
}

fn markup_re() -> &'static Regex {
    MARKUP_RE.get_or_init(|| Regex::new(r"<[a-zA-Z]").unwrap())
}

/// Inputs to [`rewrite_entry`].
pub struct RewriteContext<'a> {
    /// Normalized root-relative path -> resource address.
    pub addresses: &'a HashMap<String, String>,
    pub import_map: &'a ImportMap,
    /// Set when the file set contains component source; the transpiler
    /// runtime is injected and component scripts are retyped.
    pub transpiler_url: Option<&'a str>,
}

/// True for absolute (`https:`, `data:`, `mailto:` ...) and protocol-relative
/// references, which are never rewritten.
pub fn is_external(reference: &str) -> bool {
    let r = reference.trim();
    r.starts_with("//") || scheme_re().is_match(r)
}

/// The resource address for a local reference, if one was deployed.
pub fn resolve<'a>(reference: &str, addresses: &'a HashMap<String, String>) -> Option<&'a str> {
    if is_external(reference) {
        return None;
    }
    addresses
        .get(paths::normalize_file_path(reference))
        .map(String::as_str)
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}

fn preview_err(e: impl std::fmt::Display) -> DevflowError {
    DevflowError::Preview(e.to_string())
}

// ---------------------------------------------------------------------------
// Scan pass
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Scan {
    /// Text of every `<script>` in document order (empty for external ones).
    scripts: Vec<String>,
    has_head: bool,
    has_html: bool,
}

fn scan(html: &str) -> Result<Scan> {
    let found = RefCell::new(Scan::default());
    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("script", |_el| {
                    found.borrow_mut().scripts.push(String::new());
                    Ok(())
                }),
                text!("script", |t| {
                    if let Some(last) = found.borrow_mut().scripts.last_mut() {
                        last.push_str(t.as_str());
                    }
                    Ok(())
                }),
                element!("head", |_el| {
                    found.borrow_mut().has_head = true;
                    Ok(())
                }),
                element!("html", |_el| {
                    found.borrow_mut().has_html = true;
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::new()
        },
    )
    .map_err(preview_err)?;
    Ok(found.into_inner())
}

// ---------------------------------------------------------------------------
// Rewrite pass
// ---------------------------------------------------------------------------

/// Rewrite the entry document. Malformed markup passes through; lol_html
/// is permissive and only fails on internal errors.
pub fn rewrite_entry(html: &str, ctx: &RewriteContext<'_>) -> Result<String> {
    let facts = scan(html)?;

    let mut injection = String::new();
    if let Some(url) = ctx.transpiler_url {
        injection.push_str(&format!("<script src=\"{}\"></script>", escape_attr(url)));
    }
    injection.push_str("<script type=\"importmap\">");
    injection.push_str(&ctx.import_map.to_script_json()?);
    injection.push_str("</script>");

    let script_index = Cell::new(0usize);
    let injected = Cell::new(false);

    let output = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("script", |el| {
                    let index = script_index.get();
                    script_index.set(index + 1);

                    let script_type = el.get_attribute("type").unwrap_or_default();
                    if script_type.trim().eq_ignore_ascii_case("importmap") {
                        el.remove();
                        return Ok(());
                    }

                    let original_src = el.get_attribute("src");
                    if let Some(src) = &original_src {
                        if let Some(address) = resolve(src, ctx.addresses) {
                            el.set_attribute("src", address)?;
                        }
                    }

                    if ctx.transpiler_url.is_some()
                        && script_type.trim().eq_ignore_ascii_case("module")
                    {
                        let component_src = original_src.as_deref().is_some_and(is_component_source);
                        let inline_markup = facts
                            .scripts
                            .get(index)
                            .is_some_and(|text| markup_re().is_match(text));
                        if component_src || inline_markup {
                            el.set_attribute("type", "text/babel")?;
                        }
                    }
                    Ok(())
                }),
                element!("link[href]", |el| {
                    if let Some(href) = el.get_attribute("href") {
                        if let Some(address) = resolve(&href, ctx.addresses) {
                            el.set_attribute("href", address)?;
                        }
                    }
                    Ok(())
                }),
                element!("img[src]", |el| {
                    if let Some(src) = el.get_attribute("src") {
                        if let Some(address) = resolve(&src, ctx.addresses) {
                            el.set_attribute("src", address)?;
                        }
                    }
                    Ok(())
                }),
                element!("a[href]", |el| {
                    if let Some(href) = el.get_attribute("href") {
                        if let Some(address) = resolve(&href, ctx.addresses) {
                            el.set_attribute("href", address)?;
                        }
                    }
                    Ok(())
                }),
                element!("head", |el| {
                    if !injected.get() {
                        el.prepend(&injection, ContentType::Html);
                        injected.set(true);
                    }
                    Ok(())
                }),
                element!("html", |el| {
                    if !facts.has_head && !injected.get() {
                        el.prepend(&format!("<head>{injection}</head>"), ContentType::Html);
                        injected.set(true);
                    }
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::new()
        },
    )
    .map_err(preview_err)?;

    if injected.get() {
        Ok(output)
    } else {
        tracing::debug!(has_html = facts.has_html, "entry document has no head; prepending one");
        Ok(format!("<head>{injection}</head>{output}"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn addresses(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn rewrite(html: &str, map: &HashMap<String, String>, transpiler: Option<&str>) -> String {
        let import_map = ImportMap::default();
        rewrite_entry(
            html,
            &RewriteContext {
                addresses: map,
                import_map: &import_map,
                transpiler_url: transpiler,
            },
        )
        .unwrap()
    }

    #[test]
    fn external_reference_detection() {
        assert!(is_external("https://example.com/x.png"));
        assert!(is_external("//cdn.example.com/x.js"));
        assert!(is_external("data:image/png;base64,AAAA"));
        assert!(is_external("mailto:a@b.c"));
        assert!(!is_external("img/logo.png"));
        assert!(!is_external("/styles/site.css"));
    }

    #[test]
    fn local_reference_rewritten_external_untouched() {
        let map = addresses(&[("img/logo.png", "/preview/1")]);
        let html = r#"<html><head></head><body><img src="img/logo.png"><img src="https://example.com/x.png"></body></html>"#;
        let out = rewrite(html, &map, None);
        assert!(out.contains(r#"<img src="/preview/1">"#));
        assert!(out.contains(r#"<img src="https://example.com/x.png">"#));
    }

    #[test]
    fn leading_slash_and_dot_are_stripped_for_lookup() {
        let map = addresses(&[("css/site.css", "/preview/c"), ("app.js", "/preview/j")]);
        let html = r#"<head><link rel="stylesheet" href="/css/site.css"><script src="./app.js"></script></head>"#;
        let out = rewrite(html, &map, None);
        assert!(out.contains(r#"href="/preview/c""#));
        assert!(out.contains(r#"src="/preview/j""#));
    }

    #[test]
    fn unmapped_and_data_urls_pass_through() {
        let map = addresses(&[]);
        let html = r#"<head></head><a href="about.html">About</a><img src="data:image/gif;base64,R0lG">"#;
        let out = rewrite(html, &map, None);
        assert!(out.contains(r#"<a href="about.html">About</a>"#));
        assert!(out.contains(r#"src="data:image/gif;base64,R0lG""#));
    }

    #[test]
    fn import_map_replaces_existing_and_leads_head() {
        let mut import_map = ImportMap::default();
        import_map.register_script("src/main.js", "/preview/m");
        let html = r#"<html><head><title>T</title><script type="importmap">{"imports":{}}</script></head><body></body></html>"#;
        let out = rewrite_entry(
            html,
            &RewriteContext {
                addresses: &HashMap::new(),
                import_map: &import_map,
                transpiler_url: None,
            },
        )
        .unwrap();
        assert_eq!(out.matches("type=\"importmap\"").count(), 1);
        assert!(out.contains("<head><script type=\"importmap\">"));
        assert!(out.contains("\"/src/main\": \"/preview/m\""));
        assert!(!out.contains(r#"{"imports":{}}"#));
    }

    #[test]
    fn transpiler_injected_first_and_component_scripts_retyped() {
        let map = addresses(&[("src/App.jsx", "/preview/app")]);
        let html = concat!(
            "<html><head><meta charset=\"utf-8\"></head><body>",
            "<script type=\"module\" src=\"src/App.jsx\"></script>",
            "<script type=\"module\">render(<App />)</script>",
            "<script type=\"module\">console.log(1 < 2)</script>",
            "<script>plain()</script>",
            "</body></html>"
        );
        let out = rewrite(html, &map, Some("https://unpkg.com/@babel/standalone/babel.min.js"));

        let babel = out.find("babel.min.js").unwrap();
        let importmap = out.find("type=\"importmap\"").unwrap();
        let meta = out.find("<meta").unwrap();
        assert!(babel < importmap && importmap < meta);

        assert!(out.contains(r#"<script type="text/babel" src="/preview/app"></script>"#));
        assert!(out.contains(r#"<script type="text/babel">render(<App />)</script>"#));
        assert!(out.contains(r#"<script type="module">console.log(1 < 2)</script>"#));
        assert!(out.contains("<script>plain()</script>"));
    }

    #[test]
    fn modules_left_alone_without_component_source() {
        let out = rewrite(
            r#"<head></head><script type="module">render(<App />)</script>"#,
            &HashMap::new(),
            None,
        );
        assert!(out.contains(r#"<script type="module">"#));
        assert!(!out.contains("babel"));
    }

    #[test]
    fn missing_head_is_created() {
        let out = rewrite("<html><body><p>hi</p></body></html>", &HashMap::new(), None);
        assert!(out.starts_with("<html><head><script type=\"importmap\">"));

        let bare = rewrite("<p>hi</p>", &HashMap::new(), None);
        assert!(bare.starts_with("<head><script type=\"importmap\">"));
        assert!(bare.ends_with("<p>hi</p>"));
    }
}
