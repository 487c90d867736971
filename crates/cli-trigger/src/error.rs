//! Error taxonomy for the trigger
//!
//! `ConfigError` aborts startup. `TriggerError` ends a single invocation and
//! maps to a non-zero process exit.

use thiserror::Error;

/// Errors raised while building the command table
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no commands found for cli trigger '{0}'")]
    NoHandlers(String),

    #[error("at most one handler can be unnamed in the cli trigger")]
    MultipleUnnamed,

    #[error("cannot have duplicate handler names in the cli trigger: '{0}'")]
    DuplicateCommand(String),

    #[error("command name '{0}' is reserved")]
    ReservedName(String),

    #[error("single command mode requires exactly one handler, found {0}")]
    SingleCommandCount(usize),

    #[error("malformed flag descriptor '{descriptor}': expected 'name||default||usage', found {fields} field(s)")]
    MalformedDescriptor { descriptor: String, fields: usize },

    #[error("invalid flag name '{0}'")]
    InvalidFlagName(String),

    #[error("flag '{flag}' defined more than once for command '{command}'")]
    DuplicateFlag { command: String, flag: String },

    #[error("invalid settings for {scope}: {source}")]
    InvalidSettings {
        scope: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors that end an invocation
///
/// Every variant has already been reported on the error stream by the time
/// the dispatcher returns it.
#[derive(Error, Debug)]
pub enum TriggerError {
    #[error("unknown command `{0}`")]
    CommandNotFound(String),

    #[error("{message}")]
    FlagParse { command: String, message: String },

    #[error("{0:#}")]
    Handler(anyhow::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TriggerError {
    /// Process exit code for this failure
    pub fn exit_code(&self) -> i32 {
        1
    }
}
