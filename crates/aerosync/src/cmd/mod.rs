use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use aerosync_design::DesignSnapshot;
use clap::{Args, Subcommand};

use crate::exit::{design_error, io_error, CliError, CliResult, INTERNAL, USAGE};
use crate::output::OutputFormat;

pub mod decode;
pub mod push;
pub mod replay;
pub mod serve;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode a captured binary frame and print a summary.
    Decode(DecodeArgs),
    /// Push one design snapshot and print the engine's reply.
    Push(PushArgs),
    /// Drive the sync engine from an edit script.
    Replay(ReplayArgs),
    /// Run a mock geometry engine for local development.
    Serve(ServeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Decode(args) => decode::run(args, format),
        Command::Push(args) => push::run(args, format),
        Command::Replay(args) => replay::run(args, format),
        Command::Serve(args) => serve::run(args),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// File holding one binary frame.
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct PushArgs {
    /// Engine preview endpoint (e.g. ws://127.0.0.1:8000/ws/preview).
    #[arg(env = "AEROSYNC_URL")]
    pub url: String,
    /// Design document to send. Default: the built-in default design.
    #[arg(long, value_name = "FILE")]
    pub design: Option<PathBuf>,
    /// Maximum time to wait for the connection and the reply (e.g. 10s, 500ms).
    #[arg(long, default_value = "10s")]
    pub wait_timeout: String,
    /// Reconnect attempts before giving up.
    #[arg(long, default_value_t = 0)]
    pub max_retries: u32,
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Engine preview endpoint (e.g. ws://127.0.0.1:8000/ws/preview).
    #[arg(env = "AEROSYNC_URL")]
    pub url: String,
    /// JSON-lines edit script.
    #[arg(long, value_name = "FILE")]
    pub script: PathBuf,
    /// Starting design document. Default: the built-in default design.
    #[arg(long, value_name = "FILE")]
    pub design: Option<PathBuf>,
    /// Drag throttle window in milliseconds.
    #[arg(long, default_value_t = 100)]
    pub throttle_ms: u64,
    /// Text debounce quiet period in milliseconds.
    #[arg(long, default_value_t = 300)]
    pub debounce_ms: u64,
    /// Reconnect attempts before giving up.
    #[arg(long, default_value_t = 5)]
    pub max_retries: u32,
    /// Maximum time to wait for the connection and for the last reply.
    #[arg(long, default_value = "10s")]
    pub wait_timeout: String,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on.
    #[arg(default_value = "127.0.0.1:8000")]
    pub addr: String,
    /// Exit after answering N snapshots.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Run `future` to completion on a fresh runtime.
pub fn block_on<F: Future>(future: F) -> CliResult<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| CliError::new(INTERNAL, format!("failed to start runtime: {err}")))?;
    Ok(runtime.block_on(future))
}

pub fn load_design(path: Option<&Path>) -> CliResult<DesignSnapshot> {
    let Some(path) = path else {
        return Ok(DesignSnapshot::default());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?;
    DesignSnapshot::from_json(&text)
        .map_err(|err| design_error(&format!("invalid design {}", path.display()), err))
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
