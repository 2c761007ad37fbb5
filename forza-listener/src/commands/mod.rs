//! Command orchestration.
//!
//! `listen` wires the CLI configuration to the ingest loop.

pub mod listen;

pub use listen::{bind_source, connect_sink, execute_listen, open_logger};

use std::io;
use std::path::PathBuf;

use forza_sink::SinkError;
use thiserror::Error;

use crate::cli::CliError;

/// Errors from command execution. All of them are startup failures.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] CliError),

    #[error("cannot open log file {}: {source}", path.display())]
    LogFile { path: PathBuf, source: io::Error },

    #[error("sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("cannot bind UDP port {port}: {source}")]
    Bind { port: u16, source: io::Error },
}

/// Result of command execution.
pub type CommandResult<T> = Result<T, CommandError>;
