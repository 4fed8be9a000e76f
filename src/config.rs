//! Pipeline configuration.
//!
//! A config file names the data sources to read, the processors to run over
//! every extracted item, and the outputs to write. Each entry carries a
//! `type` key resolved through the [`Registry`](crate::registry::Registry),
//! an `enabled` flag, and a flat bag of type-specific settings that the
//! selected component parses for itself.
//!
//! ```json
//! {
//!   "version": "2.0.0",
//!   "data_sources": {
//!     "conversations": { "type": "conversation_json", "path": "chats.json", "enabled": true }
//!   },
//!   "processors": {
//!     "keyword_matcher": { "type": "keyword", "config_path": "keywords.json", "case_sensitive": false }
//!   },
//!   "outputs": {
//!     "text_files": { "type": "text_file", "output_dir": "output" }
//!   },
//!   "logging": { "level": "INFO", "console": true, "file": null },
//!   "security": { "prompt_delete_outputs": false }
//! }
//! ```
//!
//! Files ending in `.toml` use the same schema in TOML form.

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ArkiverError;

pub const DEFAULT_CONFIG_PATH: &str = "arkiver_config.json";
pub const CONFIG_VERSION: &str = "2.0.0";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub data_sources: BTreeMap<String, ComponentEntry>,
    #[serde(default)]
    pub processors: BTreeMap<String, ComponentEntry>,
    #[serde(default)]
    pub outputs: BTreeMap<String, ComponentEntry>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub security: SecurityConfig,
}

fn default_version() -> String {
    CONFIG_VERSION.to_string()
}

/// One configured source, processor, or output.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ComponentEntry {
    /// Registry key selecting the implementation.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Remaining type-specific keys.
    #[serde(flatten)]
    pub settings: Map<String, Value>,
}

fn default_enabled() -> bool {
    true
}

impl ComponentEntry {
    pub fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            enabled: true,
            settings: Map::new(),
        }
    }

    /// Builder-style helper for assembling entries in code.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.settings.insert(key.to_string(), value.into());
        self
    }

    /// Decode the settings bag into a component's typed settings.
    ///
    /// `component` is the configured entry name, used in the error.
    pub fn settings_as<T: DeserializeOwned>(&self, component: &str) -> Result<T, ArkiverError> {
        serde_json::from_value(Value::Object(self.settings.clone()))
            .map_err(|e| ArkiverError::config(component, e.to_string()))
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default = "default_console")]
    pub console: bool,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_level() -> String {
    "INFO".to_string()
}
fn default_console() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            console: true,
            file: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct SecurityConfig {
    /// Offer to delete generated files once a run finishes.
    #[serde(default)]
    pub prompt_delete_outputs: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            data_sources: BTreeMap::new(),
            processors: BTreeMap::new(),
            outputs: BTreeMap::new(),
            logging: LoggingConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

impl Config {
    /// Load a config file, picking JSON or TOML from the extension.
    pub fn load(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = if is_toml(path) {
            toml::from_str(&content).with_context(|| "Failed to parse config file")?
        } else {
            serde_json::from_str(&content).with_context(|| "Failed to parse config file")?
        };

        config.validate()?;
        Ok(config)
    }

    /// Write the config back to disk in the format implied by `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = if is_toml(path) {
            toml::to_string_pretty(self).with_context(|| "Failed to serialize config")?
        } else {
            serde_json::to_string_pretty(self).with_context(|| "Failed to serialize config")?
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create config directory: {}", parent.display())
                })?;
            }
        }
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let sections = [
            ("data_sources", &self.data_sources),
            ("processors", &self.processors),
            ("outputs", &self.outputs),
        ];
        for (section, entries) in sections {
            for (name, entry) in entries {
                if entry.kind.trim().is_empty() {
                    bail!("{}.{}: 'type' must not be empty", section, name);
                }
            }
        }
        Ok(())
    }

    pub fn enabled_sources(&self) -> impl Iterator<Item = (&String, &ComponentEntry)> {
        self.data_sources.iter().filter(|(_, e)| e.enabled)
    }

    pub fn enabled_processors(&self) -> impl Iterator<Item = (&String, &ComponentEntry)> {
        self.processors.iter().filter(|(_, e)| e.enabled)
    }

    pub fn enabled_outputs(&self) -> impl Iterator<Item = (&String, &ComponentEntry)> {
        self.outputs.iter().filter(|(_, e)| e.enabled)
    }

    /// Starter configuration: a text-file output plus, when paths are
    /// given, a conversation source and a keyword processor.
    pub fn template(
        conversations: Option<&Path>,
        keywords: Option<&Path>,
        output_dir: &Path,
    ) -> Config {
        let mut config = Config::default();

        config.outputs.insert(
            "text_files".to_string(),
            ComponentEntry::new("text_file")
                .with("output_dir", output_dir.to_string_lossy().to_string())
                .with("include_uncategorized", true)
                .with("include_context", true),
        );

        if let Some(path) = conversations {
            config.data_sources.insert(
                "conversations".to_string(),
                ComponentEntry::new("conversation_json")
                    .with("path", path.to_string_lossy().to_string()),
            );
        }

        if let Some(path) = keywords {
            config.processors.insert(
                "keyword_matcher".to_string(),
                ComponentEntry::new("keyword")
                    .with("config_path", path.to_string_lossy().to_string())
                    .with("case_sensitive", false),
            );
        }

        config
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("toml"))
        .unwrap_or(false)
}
