//! Pulling payloads out of free-form model replies.

use regex::Regex;
use std::sync::OnceLock;

static CODE_BLOCK_RE: OnceLock<Regex> = OnceLock::new();
static MERMAID_RE: OnceLock<Regex> = OnceLock::new();
static JSON_FENCE_RE: OnceLock<Regex> = OnceLock::new();

fn code_block_re() -> &'static Regex {
    // Greedy: spans from the first fence to the last.
    CODE_BLOCK_RE.get_or_init(|| Regex::new(r"(?s)```(?:\w+\n)?(.+)```").unwrap())
}

fn mermaid_re() -> &'static Regex {
    MERMAID_RE.get_or_init(|| Regex::new(r"(?s)```mermaid\s*(.*?)\s*```").unwrap())
}

fn json_fence_re() -> &'static Regex {
    JSON_FENCE_RE.get_or_init(|| Regex::new(r"(?s)^```(?:json|JSON)?\s*(.*?)\s*```$").unwrap())
}

/// The body of the fenced code block in `text`, trimmed; `text` itself when
/// there is no fence.
pub fn code_block(text: &str) -> String {
    match code_block_re().captures(text).and_then(|c| c.get(1)) {
        Some(body) => body.as_str().trim().to_string(),
        None => text.to_string(),
    }
}

/// Mermaid source from a reply: the body of a ```mermaid fence, or the whole
/// reply when it already starts with a diagram keyword.
pub fn mermaid(text: &str) -> Option<String> {
    if let Some(body) = mermaid_re().captures(text).and_then(|c| c.get(1)) {
        let body = body.as_str().trim();
        if !body.is_empty() {
            return Some(body.to_string());
        }
    }
    let trimmed = text.trim();
    if trimmed.starts_with("graph") || trimmed.starts_with("flowchart") {
        return Some(trimmed.to_string());
    }
    None
}

/// Strip whitespace and an optional surrounding ```json fence.
pub fn json_payload(text: &str) -> &str {
    let trimmed = text.trim();
    match json_fence_re().captures(trimmed).and_then(|c| c.get(1)) {
        Some(body) => body.as_str(),
        None => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_block_extracts_fenced_body() {
        let reply = "Here you go:\n```javascript\ntest('adds', () => {});\n```\nEnjoy.";
        assert_eq!(code_block(reply), "test('adds', () => {});");
    }

    #[test]
    fn code_block_without_fence_is_identity() {
        assert_eq!(code_block("def test_x(): pass"), "def test_x(): pass");
    }

    #[test]
    fn mermaid_from_fence() {
        let reply = "```mermaid\ngraph TD\n  A-->B\n```";
        assert_eq!(mermaid(reply).as_deref(), Some("graph TD\n  A-->B"));
    }

    #[test]
    fn mermaid_fallbacks() {
        assert_eq!(
            mermaid("  flowchart LR\n A-->B ").as_deref(),
            Some("flowchart LR\n A-->B")
        );
        assert!(mermaid("I cannot draw that.").is_none());
    }

    #[test]
    fn json_payload_tolerates_fence() {
        assert_eq!(json_payload("  [1, 2] \n"), "[1, 2]");
        assert_eq!(json_payload("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(json_payload("```\n[]\n```"), "[]");
    }
}
