//! Widget configuration loaded from TOML files
//!
//! Every section is optional; a missing file or section falls back to the
//! defaults the widget ships with.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::conversation::PendingPolicy;
use crate::widget::drag::WidgetPosition;

/// Root widget configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WidgetConfig {
    /// Assistant backend settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Panel appearance and placement
    #[serde(default)]
    pub widget: PanelConfig,

    /// Conversation behaviour
    #[serde(default)]
    pub chat: ChatConfig,

    /// Page to ingest when no URL is given on the command line
    #[serde(default)]
    pub page_url: Option<String>,
}

impl WidgetConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: WidgetConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.url.trim().is_empty() {
            return Err(ConfigError::Validation("backend.url must not be empty".into()));
        }
        if !self.widget.top.is_finite() || !self.widget.left.is_finite() {
            return Err(ConfigError::Validation(
                "widget.top and widget.left must be finite numbers".into(),
            ));
        }
        Ok(())
    }
}

/// Backend connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the chat/indexing service
    #[serde(default = "default_backend_url")]
    pub url: String,
}

fn default_backend_url() -> String {
    "http://localhost:8000".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
        }
    }
}

/// Panel chrome and initial placement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default = "default_placeholder")]
    pub placeholder: String,

    /// Initial offset from the top of the document, in pixels
    #[serde(default = "default_top")]
    pub top: f64,

    /// Initial offset from the left of the document, in pixels
    #[serde(default = "default_left")]
    pub left: f64,
}

fn default_title() -> String {
    "API Doc AI Assistant".to_string()
}

fn default_placeholder() -> String {
    "Ask a question about the API...".to_string()
}

fn default_top() -> f64 {
    20.0
}

fn default_left() -> f64 {
    20.0
}

impl PanelConfig {
    pub fn position(&self) -> WidgetPosition {
        WidgetPosition::new(self.top, self.left)
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            placeholder: default_placeholder(),
            top: default_top(),
            left: default_left(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatConfig {
    /// `reject` or `queue`
    #[serde(default)]
    pub pending_policy: PendingPolicy,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}
