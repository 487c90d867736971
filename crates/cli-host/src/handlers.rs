//! Built-in handler kinds

use std::process::{Command, Stdio};

use anyhow::{bail, Context, Result};
use cli_trigger::{Handler, InvocationContext};
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::{HandlerConfig, HandlerKind, HostConfig};

/// Instantiate every configured handler
pub fn build(config: &HostConfig) -> Result<Vec<Box<dyn Handler>>> {
    config.handlers.iter().map(build_one).collect()
}

fn build_one(config: &HandlerConfig) -> Result<Box<dyn Handler>> {
    let handler: Box<dyn Handler> = match config.kind {
        HandlerKind::Echo => Box::new(EchoHandler {
            name: config.name.clone(),
            settings: config.settings.clone(),
        }),
        HandlerKind::Exec => Box::new(ExecHandler::new(config.name.clone(), config.settings.clone())?),
    };
    Ok(handler)
}

/// Get a boolean flag from a request
fn get_flag_bool(request: &Map<String, Value>, key: &str) -> bool {
    request
        .get("flags")
        .and_then(|flags| flags.get(key))
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

/// Replies with the request it received, as JSON
pub struct EchoHandler {
    name: String,
    settings: Map<String, Value>,
}

impl Handler for EchoHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn settings(&self) -> &Map<String, Value> {
        &self.settings
    }

    fn handle(&self, _ctx: &InvocationContext, request: Map<String, Value>) -> Result<Map<String, Value>> {
        let pretty = get_flag_bool(&request, "pretty");
        let request = Value::Object(request);

        let data = if pretty {
            serde_json::to_string_pretty(&request)?
        } else {
            request.to_string()
        };

        let mut response = Map::new();
        response.insert("data".to_string(), Value::String(data));
        Ok(response)
    }
}

/// Runs the program from its `exec` setting with the parsed flags and args
///
/// Flags are passed as `--name=value`, followed by the positional args.
/// The program's stdout is the reply.
pub struct ExecHandler {
    name: String,
    settings: Map<String, Value>,
    program: String,
    leading_args: Vec<String>,
}

impl ExecHandler {
    pub fn new(name: String, settings: Map<String, Value>) -> Result<Self> {
        let exec: Vec<String> = match settings.get("exec") {
            Some(value) => serde_json::from_value(value.clone())
                .with_context(|| format!("Handler '{}': 'exec' must be an array of strings", name))?,
            None => bail!("Handler '{}' has kind 'exec' but no 'exec' setting", name),
        };

        let Some((program, leading_args)) = exec.split_first() else {
            bail!("Handler '{}': 'exec' must name a program", name);
        };

        Ok(Self {
            program: program.clone(),
            leading_args: leading_args.to_vec(),
            name,
            settings,
        })
    }

    /// Command-line arguments for one request
    fn command_args(&self, request: &Map<String, Value>) -> Vec<String> {
        let mut args = self.leading_args.clone();

        if let Some(flags) = request.get("flags").and_then(|f| f.as_object()) {
            for (name, value) in flags {
                let value = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                args.push(format!("--{}={}", name, value));
            }
        }

        if let Some(positional) = request.get("args").and_then(|a| a.as_array()) {
            args.extend(positional.iter().filter_map(|v| v.as_str()).map(String::from));
        }

        args
    }
}

impl Handler for ExecHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn settings(&self) -> &Map<String, Value> {
        &self.settings
    }

    fn handle(&self, ctx: &InvocationContext, request: Map<String, Value>) -> Result<Map<String, Value>> {
        let args = self.command_args(&request);
        debug!("Running {} for '{}': {:?}", self.program, ctx.command, args);

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to execute {}", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "{} exited with code {}: {}",
                self.program,
                output.status.code().unwrap_or(-1),
                stderr.trim()
            );
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut response = Map::new();
        response.insert(
            "data".to_string(),
            Value::String(stdout.trim_end_matches('\n').to_string()),
        );
        Ok(response)
    }
}
