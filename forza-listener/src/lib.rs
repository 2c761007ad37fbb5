//! Forza telemetry listener.
//!
//! This crate receives Forza Data Out datagrams over UDP, decodes them,
//! and forwards selected records to a Kinesis stream. It handles argument
//! parsing and validation, logging, rate limiting, and the race-aware
//! forwarding policy.

pub mod cli;
pub mod commands;
pub mod exit;
pub mod ingest;
pub mod logger;
pub mod policy;
pub mod rate_limit;
pub mod source;

pub use cli::{
    parse_from, Cli, CliError, DEFAULT_OUTPUT_FILENAME, DEFAULT_PORT, DEFAULT_STREAM_NAME,
};
pub use commands::{
    bind_source, connect_sink, execute_listen, open_logger, CommandError, CommandResult,
};
pub use ingest::{run_ingest, IngestConfig, IngestStats, Outcome, Pipeline, MAX_DATAGRAM_SIZE};
pub use logger::{Level, LogEntry, Logger, MockLogger, NullLogger, StderrLogger};
pub use policy::{Decision, ForwardingPolicy, Mode, RaceEvent, Verdict, PROGRESS_EVERY};
pub use rate_limit::{RateLimiter, DEFAULT_LIMIT_SECS};
pub use source::{DatagramSource, ScriptedSource, UdpSource};
