//! CLI argument parsing for the Forza telemetry listener.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use forza_packet::PacketFormat;
use forza_sink::{SinkConfig, DEFAULT_MAX_ATTEMPTS, DEFAULT_PARTITION_KEY, DEFAULT_TIMEOUT_SECS};
use thiserror::Error;

use crate::ingest::IngestConfig;
use crate::logger::Level;
use crate::policy::Mode;
use crate::rate_limit::DEFAULT_LIMIT_SECS;

/// Default UDP port Forza sends Data Out packets to.
pub const DEFAULT_PORT: u16 = 65530;

/// Default file the log is mirrored to.
pub const DEFAULT_OUTPUT_FILENAME: &str = "out.log";

/// Default Kinesis stream name.
pub const DEFAULT_STREAM_NAME: &str = "forza-stream";

/// Errors from CLI argument validation.
#[derive(Debug, Error, PartialEq)]
pub enum CliError {
    #[error("port must be between 1 and 65535, got {0}")]
    InvalidPort(u16),

    #[error("limit must be a finite number of seconds >= 0, got {0}")]
    InvalidLimit(f64),

    #[error("kinesis stream name must not be empty")]
    EmptyStreamName,

    #[error("partition key must not be empty")]
    EmptyPartitionKey,

    #[error("max-attempts must be at least 1, got {0}")]
    InvalidMaxAttempts(u32),

    #[error("timeout-sec must be at least 1, got {0}")]
    InvalidTimeout(u64),
}

/// Forza Data Out listener - forwards race telemetry to Amazon Kinesis.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "forza-listener")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// UDP port to listen on (set the same port in the game's Data Out settings).
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Log every decoded record.
    #[arg(short, long)]
    pub verbose: bool,

    /// File the log output is mirrored to.
    #[arg(short = 'f', long, default_value = DEFAULT_OUTPUT_FILENAME)]
    pub output_filename: PathBuf,

    /// When to forward records: always, or only while a race is on.
    #[arg(short, long, value_enum, default_value_t = Mode::Always)]
    pub mode: Mode,

    /// Kinesis data stream records are published to.
    #[arg(short = 'k', long = "kinesisstreamname", default_value = DEFAULT_STREAM_NAME)]
    pub stream_name: String,

    /// Minimum seconds between forwarded records (0 forwards every packet).
    #[arg(long, default_value_t = DEFAULT_LIMIT_SECS)]
    pub limit: f64,

    /// Data Out packet format sent by the game (sled, dash or horizon).
    #[arg(long, default_value_t = PacketFormat::Horizon)]
    pub packet_format: PacketFormat,

    /// Partition key for published records.
    #[arg(long, default_value = DEFAULT_PARTITION_KEY)]
    pub partition_key: String,

    /// AWS region (default: from environment or profile).
    #[arg(long)]
    pub region: Option<String>,

    /// AWS profile name.
    #[arg(long)]
    pub profile: Option<String>,

    /// Kinesis endpoint URL override (e.g. LocalStack).
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Request attempts per publish, including the first.
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,

    /// Upper bound in seconds on one publish, retries included.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_sec: u64,

    /// Do not check that the stream exists at startup.
    #[arg(long)]
    pub skip_stream_check: bool,
}

impl Cli {
    /// Validate the arguments.
    pub fn validate(&self) -> Result<(), CliError> {
        if self.port == 0 {
            return Err(CliError::InvalidPort(self.port));
        }
        if !self.limit.is_finite() || self.limit < 0.0 {
            return Err(CliError::InvalidLimit(self.limit));
        }
        if self.stream_name.trim().is_empty() {
            return Err(CliError::EmptyStreamName);
        }
        if self.partition_key.is_empty() {
            return Err(CliError::EmptyPartitionKey);
        }
        if self.max_attempts == 0 {
            return Err(CliError::InvalidMaxAttempts(self.max_attempts));
        }
        if self.timeout_sec == 0 {
            return Err(CliError::InvalidTimeout(self.timeout_sec));
        }
        Ok(())
    }

    /// Log level selected by --verbose.
    pub fn verbosity(&self) -> Level {
        Level::from_verbose(self.verbose)
    }

    /// Kinesis client settings.
    pub fn sink_config(&self) -> SinkConfig {
        SinkConfig {
            region: self.region.clone(),
            profile: self.profile.clone(),
            endpoint: self.endpoint.clone(),
            partition_key: self.partition_key.clone(),
            max_attempts: self.max_attempts,
            timeout: Duration::from_secs(self.timeout_sec),
        }
    }

    /// Settings for the ingest pipeline.
    pub fn ingest_config(&self) -> IngestConfig {
        IngestConfig {
            mode: self.mode,
            limit_secs: self.limit,
            stream_name: self.stream_name.clone(),
        }
    }
}

/// Parse CLI arguments from an iterator of strings.
/// Useful for testing.
pub fn parse_from<I, T>(iter: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(iter)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(args: &[&str]) -> Cli {
        let mut argv = vec!["forza-listener"];
        argv.extend_from_slice(args);
        parse_from(argv).expect("parse")
    }

    // ===========================================
    // Defaults
    // ===========================================

    #[test]
    fn test_defaults() {
        let cli = parse_ok(&[]);
        assert_eq!(cli.port, 65530);
        assert!(!cli.verbose);
        assert_eq!(cli.output_filename, PathBuf::from("out.log"));
        assert_eq!(cli.mode, Mode::Always);
        assert_eq!(cli.stream_name, "forza-stream");
        assert_eq!(cli.limit, 10.0);
        assert_eq!(cli.packet_format, PacketFormat::Horizon);
        assert_eq!(cli.partition_key, "forza-stream");
        assert_eq!(cli.region, None);
        assert_eq!(cli.profile, None);
        assert_eq!(cli.endpoint, None);
        assert_eq!(cli.max_attempts, 3);
        assert_eq!(cli.timeout_sec, 5);
        assert!(!cli.skip_stream_check);
        assert!(cli.validate().is_ok());
    }

    // ===========================================
    // Short and long flags
    // ===========================================

    #[test]
    fn test_port_short_and_long() {
        assert_eq!(parse_ok(&["-p", "5300"]).port, 5300);
        assert_eq!(parse_ok(&["--port", "5301"]).port, 5301);
    }

    #[test]
    fn test_port_out_of_range_rejected() {
        assert!(parse_from(["forza-listener", "-p", "70000"]).is_err());
        assert!(parse_from(["forza-listener", "-p", "-1"]).is_err());
    }

    #[test]
    fn test_verbose_short_and_long() {
        assert!(parse_ok(&["-v"]).verbose);
        assert!(parse_ok(&["--verbose"]).verbose);
    }

    #[test]
    fn test_output_filename() {
        assert_eq!(
            parse_ok(&["-f", "/tmp/forza.log"]).output_filename,
            PathBuf::from("/tmp/forza.log")
        );
        assert_eq!(
            parse_ok(&["--output-filename", "race.log"]).output_filename,
            PathBuf::from("race.log")
        );
    }

    #[test]
    fn test_mode_values() {
        assert_eq!(parse_ok(&["-m", "race"]).mode, Mode::Race);
        assert_eq!(parse_ok(&["--mode", "always"]).mode, Mode::Always);
    }

    #[test]
    fn test_mode_invalid() {
        let err = parse_from(["forza-listener", "-m", "sometimes"]).unwrap_err();
        assert!(err.to_string().contains("sometimes"));
    }

    #[test]
    fn test_stream_name_flag() {
        assert_eq!(parse_ok(&["-k", "laps"]).stream_name, "laps");
        assert_eq!(
            parse_ok(&["--kinesisstreamname", "laps2"]).stream_name,
            "laps2"
        );
    }

    #[test]
    fn test_limit() {
        assert_eq!(parse_ok(&["--limit", "0"]).limit, 0.0);
        assert_eq!(parse_ok(&["--limit", "0.5"]).limit, 0.5);
        assert!(parse_from(["forza-listener", "--limit", "soon"]).is_err());
    }

    #[test]
    fn test_packet_format() {
        assert_eq!(
            parse_ok(&["--packet-format", "dash"]).packet_format,
            PacketFormat::Dash
        );
        assert_eq!(
            parse_ok(&["--packet-format", "SLED"]).packet_format,
            PacketFormat::Sled
        );
        let err = parse_from(["forza-listener", "--packet-format", "fm8"]).unwrap_err();
        assert!(err.to_string().contains("fm8"));
    }

    #[test]
    fn test_aws_overrides() {
        let cli = parse_ok(&[
            "--region",
            "eu-west-1",
            "--profile",
            "racing",
            "--endpoint",
            "http://localhost:4566",
            "--partition-key",
            "car-7",
            "--max-attempts",
            "1",
            "--timeout-sec",
            "2",
            "--skip-stream-check",
        ]);
        assert_eq!(cli.region.as_deref(), Some("eu-west-1"));
        assert_eq!(cli.profile.as_deref(), Some("racing"));
        assert_eq!(cli.endpoint.as_deref(), Some("http://localhost:4566"));
        assert_eq!(cli.partition_key, "car-7");
        assert_eq!(cli.max_attempts, 1);
        assert_eq!(cli.timeout_sec, 2);
        assert!(cli.skip_stream_check);
    }

    #[test]
    fn test_unknown_flag_rejected() {
        assert!(parse_from(["forza-listener", "--dst-port", "1"]).is_err());
    }

    // ===========================================
    // Validation
    // ===========================================

    #[test]
    fn test_validate_port_zero() {
        let cli = parse_ok(&["-p", "0"]);
        assert_eq!(cli.validate(), Err(CliError::InvalidPort(0)));
    }

    #[test]
    fn test_validate_negative_limit() {
        let cli = parse_ok(&["--limit=-1"]);
        assert_eq!(cli.validate(), Err(CliError::InvalidLimit(-1.0)));
    }

    #[test]
    fn test_validate_non_finite_limit() {
        let cli = parse_ok(&["--limit", "inf"]);
        assert!(matches!(cli.validate(), Err(CliError::InvalidLimit(_))));

        let cli = parse_ok(&["--limit", "NaN"]);
        assert!(matches!(cli.validate(), Err(CliError::InvalidLimit(_))));
    }

    #[test]
    fn test_validate_zero_limit_ok() {
        assert!(parse_ok(&["--limit", "0"]).validate().is_ok());
    }

    #[test]
    fn test_validate_empty_stream_name() {
        let cli = parse_ok(&["-k", ""]);
        assert_eq!(cli.validate(), Err(CliError::EmptyStreamName));

        let cli = parse_ok(&["-k", "   "]);
        assert_eq!(cli.validate(), Err(CliError::EmptyStreamName));
    }

    #[test]
    fn test_validate_empty_partition_key() {
        let cli = parse_ok(&["--partition-key", ""]);
        assert_eq!(cli.validate(), Err(CliError::EmptyPartitionKey));
    }

    #[test]
    fn test_validate_max_attempts_zero() {
        let cli = parse_ok(&["--max-attempts", "0"]);
        assert_eq!(cli.validate(), Err(CliError::InvalidMaxAttempts(0)));
    }

    #[test]
    fn test_validate_timeout_zero() {
        let cli = parse_ok(&["--timeout-sec", "0"]);
        assert_eq!(cli.validate(), Err(CliError::InvalidTimeout(0)));
    }

    #[test]
    fn test_cli_error_messages() {
        assert_eq!(
            CliError::InvalidPort(0).to_string(),
            "port must be between 1 and 65535, got 0"
        );
        assert!(CliError::InvalidLimit(-2.0).to_string().contains("-2"));
        assert!(CliError::EmptyStreamName.to_string().contains("stream"));
    }

    // ===========================================
    // Derived configuration
    // ===========================================

    #[test]
    fn test_verbosity() {
        assert_eq!(parse_ok(&[]).verbosity(), Level::Info);
        assert_eq!(parse_ok(&["-v"]).verbosity(), Level::Debug);
    }

    #[test]
    fn test_sink_config() {
        let cli = parse_ok(&[
            "--region",
            "us-west-2",
            "--partition-key",
            "rig-1",
            "--max-attempts",
            "5",
            "--timeout-sec",
            "9",
        ]);
        let config = cli.sink_config();
        assert_eq!(config.region.as_deref(), Some("us-west-2"));
        assert_eq!(config.profile, None);
        assert_eq!(config.endpoint, None);
        assert_eq!(config.partition_key, "rig-1");
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.timeout, Duration::from_secs(9));
    }

    #[test]
    fn test_sink_config_defaults_match_sink() {
        assert_eq!(parse_ok(&[]).sink_config(), SinkConfig::default());
    }

    #[test]
    fn test_ingest_config() {
        let cli = parse_ok(&["-m", "race", "--limit", "0", "-k", "laps"]);
        let config = cli.ingest_config();
        assert_eq!(config.mode, Mode::Race);
        assert_eq!(config.limit_secs, 0.0);
        assert_eq!(config.stream_name, "laps");
    }
}
