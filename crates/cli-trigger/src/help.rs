//! Usage text for the program and for single commands
//!
//! The renderer writes to whatever stream the dispatcher hands it: stdout
//! when help was asked for, stderr when it accompanies an error.

use std::io::{self, Write};

use crate::flags::FlagKind;
use crate::registry::{HandlerCommand, Trigger};

/// Renders help for one trigger under a program display name
pub struct HelpRenderer<'a> {
    program: &'a str,
    trigger: &'a Trigger,
}

impl<'a> HelpRenderer<'a> {
    pub fn new(program: &'a str, trigger: &'a Trigger) -> Self {
        Self { program, trigger }
    }

    /// Top-level help: description, usage summary and the command list
    pub fn main_usage(&self, w: &mut dyn Write) -> io::Result<()> {
        let settings = self.trigger.settings();

        match &settings.usage {
            Some(usage) => writeln!(w, "{} - {}", self.program, usage)?,
            None => writeln!(w, "{}", self.program)?,
        }
        if let Some(long) = &settings.long {
            writeln!(w)?;
            writeln!(w, "{}", long.trim_end())?;
        }

        writeln!(w)?;
        writeln!(w, "Usage:")?;
        if settings.single_cmd {
            writeln!(w, "    {} [flags] [args...]", self.program)?;
        } else {
            writeln!(w, "    {} <command> [flags] [args...]", self.program)?;
        }

        writeln!(w)?;
        writeln!(w, "Commands:")?;
        let width = self
            .trigger
            .commands()
            .map(|c| c.name().len())
            .max()
            .unwrap_or(0);
        for cmd in self.trigger.commands() {
            match &cmd.settings().short {
                Some(short) => writeln!(w, "    {:width$}  {}", cmd.name(), short, width = width)?,
                None => writeln!(w, "    {}", cmd.name())?,
            }
        }

        writeln!(w)?;
        writeln!(
            w,
            "Use \"{} help <command>\" for more information about a command.",
            self.program
        )?;
        Ok(())
    }

    /// Help for one command: usage line, description and its flags
    pub fn command_usage(&self, w: &mut dyn Write, cmd: &HandlerCommand) -> io::Result<()> {
        let settings = cmd.settings();

        writeln!(w, "Usage:")?;
        match &settings.usage {
            Some(usage) => writeln!(w, "    {}", usage)?,
            None if self.trigger.settings().single_cmd => {
                writeln!(w, "    {} [flags] [args...]", self.program)?
            }
            None => writeln!(w, "    {} {} [flags] [args...]", self.program, cmd.name())?,
        }

        if let Some(text) = settings.long.as_ref().or(settings.short.as_ref()) {
            writeln!(w)?;
            writeln!(w, "{}", text.trim_end())?;
        }

        if cmd.schema().is_empty() {
            return Ok(());
        }

        writeln!(w)?;
        writeln!(w, "Flags:")?;
        let columns: Vec<(String, String)> = cmd
            .schema()
            .iter()
            .map(|def| {
                let left = match def.kind {
                    FlagKind::Bool(_) => format!("--{}", def.name),
                    FlagKind::Str(_) => format!("--{} string", def.name),
                };
                let right = if def.usage.is_empty() {
                    format!("(default {})", def.default_literal())
                } else {
                    format!("{} (default {})", def.usage, def.default_literal())
                };
                (left, right)
            })
            .collect();
        let width = columns.iter().map(|(left, _)| left.len()).max().unwrap_or(0);
        for (left, right) in columns {
            writeln!(w, "    {:width$}  {}", left, right, width = width)?;
        }
        Ok(())
    }
}
