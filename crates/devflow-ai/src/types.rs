use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::schema::OutputSchema;

// ─── ModelTier ────────────────────────────────────────────────────────────

/// Which configured model a feature runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTier {
    /// Slower, stronger model for generation-heavy features.
    Pro,
    /// Fast model for review-style features.
    Flash,
}

// ─── GenerationRequest ────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub tier: ModelTier,
    pub prompt: String,
    /// When set, the model is asked for JSON conforming to this shape.
    pub schema: Option<OutputSchema>,
}

impl GenerationRequest {
    pub fn text(tier: ModelTier, prompt: impl Into<String>) -> Self {
        Self {
            tier,
            prompt: prompt.into(),
            schema: None,
        }
    }

    pub fn structured(tier: ModelTier, prompt: impl Into<String>, schema: OutputSchema) -> Self {
        Self {
            tier,
            prompt: prompt.into(),
            schema: Some(schema),
        }
    }
}

// ─── Tool ─────────────────────────────────────────────────────────────────

/// The single-input code tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tool {
    Review,
    Tests,
    Docs,
    Complexity,
    Commit,
    RunReview,
}

impl Tool {
    pub fn all() -> &'static [Tool] {
        &[
            Tool::Review,
            Tool::Tests,
            Tool::Docs,
            Tool::Complexity,
            Tool::Commit,
            Tool::RunReview,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tool::Review => "review",
            Tool::Tests => "tests",
            Tool::Docs => "docs",
            Tool::Complexity => "complexity",
            Tool::Commit => "commit",
            Tool::RunReview => "run-review",
        }
    }

    pub fn tier(self) -> ModelTier {
        match self {
            Tool::Tests => ModelTier::Pro,
            _ => ModelTier::Flash,
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tool::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == s || t.as_str().replace('-', "_") == s)
            .ok_or_else(|| {
                let names: Vec<&str> = Tool::all().iter().map(|t| t.as_str()).collect();
                format!("unknown tool '{s}': expected one of {}", names.join(", "))
            })
    }
}

// ─── Gemini wire types ────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationConfig {
    pub response_mime_type: String,
    pub response_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Candidate {
    pub content: Option<Content>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorDetail {
    pub message: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate's parts.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        (!text.is_empty()).then_some(text)
    }
}
