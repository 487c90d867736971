//! Handler capability supplied by the host

use serde_json::{Map, Value};

/// Something the trigger can expose as a command
pub trait Handler {
    /// Command name; empty for the default command
    fn name(&self) -> &str;

    /// Raw handler settings (`flags`, `short`, `usage`, `long`, plus anything
    /// the handler itself understands)
    fn settings(&self) -> &Map<String, Value>;

    /// Handle one request of the form `{"args": [...], "flags": {...}}`
    ///
    /// The reply text is taken from the `data` key of the returned map.
    fn handle(&self, ctx: &InvocationContext, request: Map<String, Value>) -> anyhow::Result<Map<String, Value>>;
}

/// Information about the running invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    /// Program display name
    pub program: String,
    /// Resolved command name
    pub command: String,
}
