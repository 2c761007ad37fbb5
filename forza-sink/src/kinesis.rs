//! Amazon Kinesis Data Streams sink.
//!
//! The AWS SDK is async; the listener is a single blocking loop. The sink
//! owns a current-thread tokio runtime and blocks on each request, so a
//! publish completes (or fails) before the next datagram is read.

use std::time::Duration;

use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::BehaviorVersion;
use aws_sdk_kinesis::config::Region;
use aws_sdk_kinesis::error::DisplayErrorContext;
use aws_sdk_kinesis::primitives::Blob;
use aws_sdk_kinesis::Client;
use forza_packet::TelemetryRecord;
use tokio::runtime::{Builder, Runtime};

use crate::error::SinkError;
use crate::sink::RecordSink;

/// Default partition key for published records.
pub const DEFAULT_PARTITION_KEY: &str = "forza-stream";

/// Default number of SDK attempts per request.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default per-operation timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Configuration for the Kinesis client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkConfig {
    /// AWS region (default: from env/SDK).
    pub region: Option<String>,
    /// AWS profile name.
    pub profile: Option<String>,
    /// Kinesis-compatible endpoint URL (LocalStack, etc.).
    pub endpoint: Option<String>,
    pub partition_key: String,
    /// Attempts per request, including the first.
    pub max_attempts: u32,
    /// Upper bound on one operation, retries included.
    pub timeout: Duration,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            region: None,
            profile: None,
            endpoint: None,
            partition_key: DEFAULT_PARTITION_KEY.to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Sink publishing JSON records to a Kinesis data stream.
pub struct KinesisSink {
    runtime: Runtime,
    client: Client,
    partition_key: String,
}

impl KinesisSink {
    /// Create a Kinesis client from the default credential chain and `config`.
    ///
    /// No request is sent; use `verify_stream` to check connectivity.
    pub fn new(config: &SinkConfig) -> Result<Self, SinkError> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        let sdk_config = runtime.block_on(build_aws_config(config));

        if sdk_config.region().is_none() {
            return Err(SinkError::AwsConfig(
                "no AWS region configured (use --region or set AWS_REGION)".to_string(),
            ));
        }

        let mut kinesis_config_builder = aws_sdk_kinesis::config::Builder::from(&sdk_config);

        // Set endpoint if provided
        if let Some(endpoint) = &config.endpoint {
            kinesis_config_builder = kinesis_config_builder.endpoint_url(endpoint);
        }

        let client = Client::from_conf(kinesis_config_builder.build());

        Ok(Self {
            runtime,
            client,
            partition_key: config.partition_key.clone(),
        })
    }

    pub fn partition_key(&self) -> &str {
        &self.partition_key
    }

    /// Check that `stream_name` exists and the credentials can reach it.
    pub fn verify_stream(&self, stream_name: &str) -> Result<(), SinkError> {
        let request = self
            .client
            .describe_stream_summary()
            .stream_name(stream_name)
            .send();

        self.runtime
            .block_on(request)
            .map(|_| ())
            .map_err(|e| SinkError::StreamUnavailable {
                stream: stream_name.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })
    }
}

impl RecordSink for KinesisSink {
    fn put_record(&self, record: &TelemetryRecord, stream_name: &str) -> Result<(), SinkError> {
        let data = record.to_json_bytes()?;

        let request = self
            .client
            .put_record()
            .stream_name(stream_name)
            .partition_key(&self.partition_key)
            .data(Blob::new(data))
            .send();

        self.runtime
            .block_on(request)
            .map(|_| ())
            .map_err(|e| SinkError::PutRecord {
                stream: stream_name.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })
    }
}

/// Build AWS SDK configuration from sink settings.
async fn build_aws_config(config: &SinkConfig) -> aws_config::SdkConfig {
    let mut config_loader = aws_config::defaults(BehaviorVersion::latest())
        .retry_config(RetryConfig::standard().with_max_attempts(config.max_attempts))
        .timeout_config(
            TimeoutConfig::builder()
                .operation_timeout(config.timeout)
                .build(),
        );

    // Set region if provided
    if let Some(region) = &config.region {
        config_loader = config_loader.region(Region::new(region.clone()));
    }

    // Set profile if provided
    if let Some(profile) = &config.profile {
        config_loader = config_loader.profile_name(profile);
    }

    config_loader.load().await
}
