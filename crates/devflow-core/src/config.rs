use crate::error::{DevflowError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variables consulted for the generation API key, in order.
pub const API_KEY_VARS: &[&str] = &["GEMINI_API_KEY", "API_KEY"];

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// AiConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_pro_model")]
    pub pro_model: String,
    #[serde(default = "default_flash_model")]
    pub flash_model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_base() -> String {
    "https://generativelanguage.googleapis.com".into()
}

fn default_pro_model() -> String {
    "gemini-2.5-pro".into()
}

fn default_flash_model() -> String {
    "gemini-2.5-flash".into()
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            pro_model: default_pro_model(),
            flash_model: default_flash_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl AiConfig {
    /// The API key from the environment. Keys are never read from or
    /// written to the config file.
    pub fn api_key() -> Option<String> {
        API_KEY_VARS
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|v| !v.trim().is_empty())
    }
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub open_browser: bool,
}

fn default_port() -> u16 {
    3141
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            open_browser: false,
        }
    }
}

// ---------------------------------------------------------------------------
// PreviewConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewConfig {
    #[serde(default = "default_transpiler_url")]
    pub transpiler_url: String,
    #[serde(default = "default_resource_prefix")]
    pub resource_prefix: String,
}

fn default_transpiler_url() -> String {
    "https://unpkg.com/@babel/standalone/babel.min.js".into()
}

fn default_resource_prefix() -> String {
    "/preview".into()
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            transpiler_url: default_transpiler_url(),
            resource_prefix: default_resource_prefix(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub preview: PreviewConfig,
}

impl Config {
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(DevflowError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Like [`Config::load`], but an uninitialized root yields the defaults.
    pub fn load_or_default(root: &Path) -> Result<Self> {
        match Self::load(root) {
            Err(DevflowError::NotInitialized) => Ok(Self::default()),
            other => other,
        }
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        for (key, model) in [
            ("ai.pro_model", &self.ai.pro_model),
            ("ai.flash_model", &self.ai.flash_model),
        ] {
            if model.trim().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("{key} is empty"),
                });
            }
        }

        for (key, url) in [
            ("ai.api_base", &self.ai.api_base),
            ("preview.transpiler_url", &self.preview.transpiler_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("{key} '{url}' is not an http(s) URL"),
                });
            }
        }

        if !self.preview.resource_prefix.starts_with('/') {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "preview.resource_prefix '{}' must start with '/'",
                    self.preview.resource_prefix
                ),
            });
        }

        if self.ai.timeout_secs == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "ai.timeout_secs is 0; remote calls will fail immediately".into(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
