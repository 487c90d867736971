//! Argv dispatch
//!
//! Resolves the command token, parses the remaining arguments against the
//! command's flag schema and invokes its handler. Help and diagnostics go to
//! the injected streams: voluntary help to `out`, anything that accompanies a
//! failure to `err`.

use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::error::TriggerError;
use crate::handler::InvocationContext;
use crate::help::HelpRenderer;
use crate::registry::{Trigger, HELP_COMMAND};

/// Output and error streams of an invocation
pub struct Streams<'a> {
    pub out: &'a mut dyn Write,
    pub err: &'a mut dyn Write,
}

impl<'a> Streams<'a> {
    pub fn new(out: &'a mut dyn Write, err: &'a mut dyn Write) -> Self {
        Self { out, err }
    }
}

/// How a successful invocation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Help was printed; no handler ran
    Help,
    /// The handler's reply text, already written to `out`
    Text(String),
}

enum Resolution<'a> {
    Help,
    Command { name: String, tail: &'a [String] },
}

impl Trigger {
    /// Run one invocation for `argv` (program name first)
    ///
    /// Consumes the trigger: a process runs exactly one invocation. Errors
    /// have been reported on `streams.err` by the time they are returned.
    pub fn run(self, argv: &[String], streams: &mut Streams<'_>) -> Result<Reply, TriggerError> {
        let program = program_name(argv, self.id());
        let rest = argv.get(1..).unwrap_or_default();

        let (name, tail) = match self.resolve(&program, rest, streams)? {
            Resolution::Help => return Ok(Reply::Help),
            Resolution::Command { name, tail } => (name, tail),
        };
        debug!("resolved command '{}'", name);

        let Some(cmd) = self.command(&name) else {
            return Err(self.not_found(&program, name, streams)?);
        };

        let parsed = match cmd.schema().parse(tail) {
            Ok(parsed) => parsed,
            Err(message) => {
                writeln!(streams.err, "Error: {}.", message)?;
                HelpRenderer::new(&program, &self).command_usage(streams.err, cmd)?;
                return Err(TriggerError::FlagParse { command: name, message });
            }
        };

        let ctx = InvocationContext {
            program,
            command: name,
        };
        match cmd.invoke(&ctx, parsed) {
            Ok(text) => {
                if !text.is_empty() {
                    writeln!(streams.out, "{}", text)?;
                }
                Ok(Reply::Text(text))
            }
            Err(e) => {
                writeln!(streams.err, "Error: {:#}", e)?;
                Err(TriggerError::Handler(e))
            }
        }
    }

    fn resolve<'a>(
        &self,
        program: &str,
        rest: &'a [String],
        streams: &mut Streams<'_>,
    ) -> Result<Resolution<'a>, TriggerError> {
        let help = HelpRenderer::new(program, self);

        if self.settings().single_cmd {
            let Some(cmd) = self.commands().next() else {
                return Err(self.not_found(program, String::new(), streams)?);
            };
            if let [token] = rest {
                if token.eq_ignore_ascii_case(HELP_COMMAND) {
                    help.command_usage(streams.out, cmd)?;
                    return Ok(Resolution::Help);
                }
            }
            return Ok(Resolution::Command {
                name: cmd.name().to_string(),
                tail: rest,
            });
        }

        let Some(first) = rest.first() else {
            return match self.settings().default_command() {
                Some(default) => Ok(Resolution::Command {
                    name: default.to_string(),
                    tail: &[],
                }),
                None => {
                    help.main_usage(streams.out)?;
                    Ok(Resolution::Help)
                }
            };
        };

        if first.eq_ignore_ascii_case(HELP_COMMAND) {
            let Some(target) = rest.get(1) else {
                help.main_usage(streams.out)?;
                return Ok(Resolution::Help);
            };
            return match self.command(target) {
                Some(cmd) => {
                    help.command_usage(streams.out, cmd)?;
                    Ok(Resolution::Help)
                }
                None => Err(self.not_found(program, target.clone(), streams)?),
            };
        }

        Ok(Resolution::Command {
            name: first.clone(),
            tail: &rest[1..],
        })
    }

    /// Report an unknown command with top-level help on the error stream
    fn not_found(&self, program: &str, name: String, streams: &mut Streams<'_>) -> Result<TriggerError, TriggerError> {
        writeln!(streams.err, "Error: unknown command `{}`", name)?;
        HelpRenderer::new(program, self).main_usage(streams.err)?;
        Ok(TriggerError::CommandNotFound(name))
    }
}

/// File name of argv[0], or `fallback` without one
fn program_name(argv: &[String], fallback: &str) -> String {
    argv.first()
        .and_then(|arg0| Path::new(arg0).file_name())
        .and_then(|name| name.to_str())
        .unwrap_or(fallback)
        .to_string()
}
