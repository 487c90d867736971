//! cli-host - run configured handlers as subcommands
//!
//! Usage:
//!   cli-host help [command]
//!   cli-host <command> [flags] [args...]
//!
//! Commands come from the host configuration (see `config`). Log verbosity
//! is read once from `CLI_HOST_LOG` (an `EnvFilter` directive, default
//! `error`); logs go to stderr so stdout carries only the reply.

mod config;
mod handlers;

use std::io::{self, Write};

use anyhow::Result;
use cli_trigger::{Streams, Trigger};
use tracing_subscriber::EnvFilter;

use crate::config::HostConfig;

/// Log verbosity variable
const LOG_ENV: &str = "CLI_HOST_LOG";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("error")))
        .with_writer(std::io::stderr)
        .init();

    let code = match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let config = HostConfig::load()?;
    let handlers = handlers::build(&config)?;
    let trigger = Trigger::initialize(config.trigger_config(), handlers)?;

    let argv: Vec<String> = std::env::args().collect();
    let stdout = io::stdout();
    let stderr = io::stderr();
    let mut out = stdout.lock();
    let mut err = stderr.lock();

    let result = trigger.run(&argv, &mut Streams::new(&mut out, &mut err));
    out.flush()?;

    Ok(match result {
        Ok(_) => 0,
        Err(e) => {
            tracing::debug!("invocation failed: {}", e);
            e.exit_code()
        }
    })
}
