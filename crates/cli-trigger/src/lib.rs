//! CLI trigger - handlers exposed as named subcommands
//!
//! The host supplies a set of handlers, each with a name and a list of flag
//! descriptors. The trigger builds a command table from them once, then
//! resolves argv to a command, parses its flags, invokes the handler and
//! prints the handler's `data` reply as plain text.
//!
//! ```text
//! prog                      default command, or top-level help
//! prog help [command]       help to stdout
//! prog <command> [flags] [args...]
//! ```

pub mod bridge;
pub mod dispatch;
pub mod error;
pub mod flags;
pub mod handler;
pub mod help;
pub mod registry;
pub mod settings;

pub use dispatch::{Reply, Streams};
pub use error::{ConfigError, TriggerError};
pub use flags::{FlagDefinition, FlagKind, FlagSchema, FlagValue, ParsedArgs};
pub use handler::{Handler, InvocationContext};
pub use registry::{HandlerCommand, Trigger, TriggerConfig};
pub use settings::{HandlerSettings, Settings};
