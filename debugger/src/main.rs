use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use mockasm_asm::{
    init_logger, EngineConfig, Execution, DEFAULT_MEMORY_SIZE, DEFAULT_STACK_SIZE,
    DEFAULT_STEP_LIMIT,
};
use mockasm_debugger::{
    handle, DebuggerConfig, Request, Response, SessionError, SessionStore, DEFAULT_SESSION_TTL,
};
use tracing::{info, warn};

/// Serves `get-output` / `next-output` requests, one JSON object per line on
/// stdin, answering one JSON object per line on stdout.
#[derive(Parser, Debug)]
#[command(name = "mockasm-debugger", version, about)]
struct Cli {
    /// Run this file once, print its full trace as JSON and exit.
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Maximum number of instructions a run may execute.
    #[arg(long, env = "MOCKASM_STEP_LIMIT", default_value_t = DEFAULT_STEP_LIMIT)]
    step_limit: usize,

    /// Number of addressable memory words.
    #[arg(long, env = "MOCKASM_MEMORY_SIZE", default_value_t = DEFAULT_MEMORY_SIZE)]
    memory_size: u32,

    /// Maximum number of values on the stack.
    #[arg(long, env = "MOCKASM_STACK_SIZE", default_value_t = DEFAULT_STACK_SIZE)]
    stack_size: usize,

    /// Seconds a session may stay idle before it is dropped.
    #[arg(
        long = "session-ttl",
        value_name = "SECS",
        env = "MOCKASM_SESSION_TTL_SECS",
        default_value_t = DEFAULT_SESSION_TTL.as_secs()
    )]
    session_ttl_secs: u64,
}

impl Cli {
    fn config(&self) -> DebuggerConfig {
        DebuggerConfig {
            engine: EngineConfig {
                step_limit: self.step_limit,
                memory_size: self.memory_size,
                stack_size: self.stack_size,
            },
            session_ttl: Duration::from_secs(self.session_ttl_secs),
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_logger();
    let cli = Cli::parse();
    let config = cli.config();

    match &cli.file {
        Some(path) => run_file(path, &config),
        None => serve(&config),
    }
}

fn run_file(path: &Path, config: &DebuggerConfig) -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();
    match Execution::from_file(path, &config.engine) {
        Ok(execution) => {
            serde_json::to_writer_pretty(&mut stdout, execution.trace())?;
            writeln!(stdout)?;
            Ok(())
        }
        Err(err) => {
            let response = Response::from(&SessionError::Run(err.clone()));
            serde_json::to_writer(&mut stdout, &response)?;
            writeln!(stdout)?;
            Err(err).with_context(|| format!("running {}", path.display()))
        }
    }
}

fn serve(config: &DebuggerConfig) -> anyhow::Result<()> {
    let store = SessionStore::new(config.session_ttl);
    let mut stdout = io::stdout().lock();
    info!(?config, "waiting for requests on stdin");

    for line in io::stdin().lock().lines() {
        let line = line.context("failed to read a request")?;
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => handle(&store, config, request),
            Err(err) => {
                warn!(%err, "malformed request");
                Response::error("Bad request", err.to_string())
            }
        };
        serde_json::to_writer(&mut stdout, &response)?;
        writeln!(stdout)?;
        stdout.flush()?;
    }

    info!(sessions = store.len(), "stdin closed, exiting");
    Ok(())
}
