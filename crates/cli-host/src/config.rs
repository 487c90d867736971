//! Host configuration
//!
//! Read from `$CLI_HOST_CONFIG`, or `<config dir>/cli-host/commands.json`:
//!
//! ```json
//! {
//!   "id": "tools",
//!   "settings": { "defaultCmd": "echo", "usage": "handy tools" },
//!   "handlers": [
//!     { "name": "echo", "kind": "echo", "settings": { "flags": ["upper||false||shout"] } },
//!     { "name": "ls", "kind": "exec", "settings": { "exec": ["ls", "-1"] } }
//!   ]
//! }
//! ```

use anyhow::{Context, Result};
use cli_trigger::TriggerConfig;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};

/// Overrides the configuration file location
pub const CONFIG_ENV: &str = "CLI_HOST_CONFIG";

/// Whole host configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HostConfig {
    /// Trigger id
    #[serde(default = "default_id")]
    pub id: String,

    /// Trigger settings, passed through to the trigger
    #[serde(default)]
    pub settings: Map<String, Value>,

    /// Handlers to expose as commands
    #[serde(default)]
    pub handlers: Vec<HandlerConfig>,
}

/// One configured handler
#[derive(Debug, Clone, Deserialize)]
pub struct HandlerConfig {
    /// Command name; empty for the default command
    #[serde(default)]
    pub name: String,

    pub kind: HandlerKind,

    /// Handler settings (`flags`, `short`, `usage`, `long`, `exec`)
    #[serde(default)]
    pub settings: Map<String, Value>,
}

/// Built-in handler implementations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlerKind {
    /// Replies with the request it received
    Echo,
    /// Runs an external program
    Exec,
}

fn default_id() -> String {
    "cli-host".to_string()
}

impl Default for HostConfig {
    fn default() -> Self {
        let settings = json!({
            "short": "Print the parsed request",
            "flags": ["pretty||false||indent the output"]
        });

        Self {
            id: default_id(),
            settings: Map::new(),
            handlers: vec![HandlerConfig {
                name: "echo".to_string(),
                kind: HandlerKind::Echo,
                settings: settings.as_object().cloned().unwrap_or_default(),
            }],
        }
    }
}

impl HostConfig {
    /// Load from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    /// Load from a specific path; a missing file gives the default config
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read host config from {:?}", path))?;
            let config: Self = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse host config from {:?}", path))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Trigger-level part of the configuration
    pub fn trigger_config(&self) -> TriggerConfig {
        TriggerConfig {
            id: self.id.clone(),
            settings: self.settings.clone(),
        }
    }
}

/// Configuration file location
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return PathBuf::from(path);
    }

    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("cli-host")
        .join("commands.json")
}
