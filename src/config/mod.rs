//! Application configuration
//!
//! Layers, lowest first: built-in defaults, the TOML file named by
//! `PAGE_ASSISTANT_CONFIG`, then individual environment overrides.

pub mod file;

use std::env;
use std::path::PathBuf;

use crate::conversation::PendingPolicy;

pub use file::{ConfigError, WidgetConfig};

pub const CONFIG_PATH_VAR: &str = "PAGE_ASSISTANT_CONFIG";
pub const BACKEND_URL_VAR: &str = "PAGE_ASSISTANT_BACKEND_URL";
pub const PAGE_URL_VAR: &str = "PAGE_ASSISTANT_PAGE_URL";
pub const PENDING_POLICY_VAR: &str = "PAGE_ASSISTANT_PENDING_POLICY";

impl WidgetConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match env::var(CONFIG_PATH_VAR) {
            Ok(path) => {
                tracing::debug!(%path, "Loading widget config file");
                WidgetConfig::from_file(&PathBuf::from(path))?
            }
            Err(_) => WidgetConfig::default(),
        };

        config.apply_overrides(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Apply environment-style overrides from `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(BACKEND_URL_VAR) {
            self.backend.url = url;
        }
        if let Some(url) = lookup(PAGE_URL_VAR) {
            self.page_url = Some(url);
        }
        if let Some(policy) = lookup(PENDING_POLICY_VAR) {
            self.chat.pending_policy = match policy.trim().to_lowercase().as_str() {
                "reject" => PendingPolicy::Reject,
                "queue" => PendingPolicy::Queue,
                other => {
                    return Err(ConfigError::Validation(format!(
                        "{PENDING_POLICY_VAR} must be `reject` or `queue`, got `{other}`"
                    )))
                }
            };
        }
        self.validate()
    }
}
