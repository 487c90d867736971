//! Request/response translation around a handler call

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::debug;

use crate::flags::FlagValue;
use crate::handler::{Handler, InvocationContext};

/// Key of the reply value in a handler response
pub const REPLY_KEY: &str = "data";

/// Build the request map handed to a handler
pub fn build_request(args: &[String], flags: &BTreeMap<String, FlagValue>) -> Map<String, Value> {
    let flags: Map<String, Value> = flags
        .iter()
        .map(|(name, value)| (name.clone(), Value::from(value.clone())))
        .collect();

    let mut request = Map::new();
    request.insert(
        "args".to_string(),
        Value::Array(args.iter().cloned().map(Value::String).collect()),
    );
    request.insert("flags".to_string(), Value::Object(flags));
    request
}

/// Call the handler and turn its `data` reply into text
pub fn invoke(
    handler: &dyn Handler,
    ctx: &InvocationContext,
    args: &[String],
    flags: &BTreeMap<String, FlagValue>,
) -> anyhow::Result<String> {
    debug!("invoking handler '{}'", ctx.command);

    let response = handler
        .handle(ctx, build_request(args, flags))
        .map_err(|e| {
            debug!("error: {:#}", e);
            e
        })?;

    Ok(response.get(REPLY_KEY).map(coerce_to_string).unwrap_or_default())
}

/// Text form of a reply value
pub fn coerce_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
