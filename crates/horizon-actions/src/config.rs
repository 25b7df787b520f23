//! Persisted shortcut preferences.
//!
//! [`ActionsConfig`] stores the shortcut recognition mode, an optional
//! platform override, and per-action shortcut overrides as TOML:
//!
//! ```toml
//! shortcut_support = "sequence"
//! platform = "mac"
//!
//! [shortcuts]
//! undo = "Ctrl+Shift+Z"
//! "view:list" = "Ctrl+Alt+L"
//! ```
//!
//! Keys in `[shortcuts]` name an action, or an action and choice joined by a
//! colon. An empty value clears the shortcut.
//!
//! # Example
//!
//! ```
//! use horizon_actions::{ActionsConfig, ShortcutSupport};
//!
//! let config = ActionsConfig::from_toml_str(r#"
//! shortcut_support = "single"
//! [shortcuts]
//! undo = "Ctrl+Shift+Z"
//! "#).unwrap();
//!
//! assert_eq!(config.shortcut_support, ShortcutSupport::Single);
//! assert_eq!(config.shortcuts["undo"], "Ctrl+Shift+Z");
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use horizon_actions_core::logging::targets;
use serde::{Deserialize, Serialize};

use crate::environment::{Environment, Platform, ShortcutSupport};
use crate::error::ConfigError;
use crate::registry::ActionContext;

/// Name of the configuration file inside the application's config directory.
pub const CONFIG_FILE_NAME: &str = "shortcuts.toml";

/// Shortcut preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionsConfig {
    /// Which kinds of shortcuts are recognized.
    pub shortcut_support: ShortcutSupport,
    /// Platform family to assume instead of the detected one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    /// Primary shortcut overrides, keyed `action` or `action:choice`.
    pub shortcuts: BTreeMap<String, String>,
}

impl ActionsConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Render the configuration as TOML text.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Read a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(target: targets::CONFIG, path = %path.display(), overrides = config.shortcuts.len(), "configuration loaded");
        Ok(config)
    }

    /// Read a configuration file, falling back to the defaults if it does not
    /// exist. Other failures are returned.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            other => other,
        }
    }

    /// Write the configuration, creating parent directories as needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml_string()?)?;
        tracing::debug!(target: targets::CONFIG, path = %path.display(), "configuration saved");
        Ok(())
    }

    /// The conventional location of the configuration file for `app_name`.
    pub fn default_path(app_name: &str) -> Result<PathBuf, ConfigError> {
        ProjectDirs::from("", "", app_name)
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Capture the current mode and the primary shortcuts of `context`.
    pub fn capture(context: &ActionContext) -> Self {
        Self {
            shortcut_support: context.environment().shortcut_support(),
            platform: None,
            shortcuts: context.export_shortcuts(),
        }
    }
}

impl Environment {
    /// Create an environment from a configuration, honoring its platform
    /// override and initial shortcut support mode.
    pub fn from_config(config: &ActionsConfig) -> Self {
        let platform = config.platform.unwrap_or_else(Platform::current);
        Environment::new(platform).with_shortcut_support(config.shortcut_support)
    }
}
