//! Trigger and handler settings decoded from host-supplied maps

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::ConfigError;

/// Program-wide settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Command to run when no arguments are given
    pub default_cmd: Option<String>,

    /// The program has exactly one command and argv goes straight to it
    pub single_cmd: bool,

    /// One-line program description
    pub usage: Option<String>,

    /// Long program description
    pub long: Option<String>,
}

impl Settings {
    pub fn from_map(map: &Map<String, Value>) -> Result<Self, ConfigError> {
        decode(map, "trigger")
    }

    /// The default command, ignoring an empty name
    pub fn default_command(&self) -> Option<&str> {
        self.default_cmd.as_deref().filter(|name| !name.is_empty())
    }
}

/// Per-handler settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HandlerSettings {
    /// Flag descriptors, `name||default||usage`
    pub flags: Vec<String>,

    /// One-line description shown in the command list
    pub short: Option<String>,

    /// Custom usage line for the command
    pub usage: Option<String>,

    /// Long description shown in command help
    pub long: Option<String>,
}

impl HandlerSettings {
    pub fn from_map(map: &Map<String, Value>, command: &str) -> Result<Self, ConfigError> {
        decode(map, &format!("command '{}'", command))
    }
}

fn decode<T: serde::de::DeserializeOwned>(
    map: &Map<String, Value>,
    scope: &str,
) -> Result<T, ConfigError> {
    serde_json::from_value(Value::Object(map.clone())).map_err(|source| {
        ConfigError::InvalidSettings {
            scope: scope.to_string(),
            source,
        }
    })
}
