//! Record sinks for decoded telemetry.
//!
//! This crate provides:
//! - `RecordSink` trait, the publish contract consumed by the ingest loop
//! - `KinesisSink`, publishing JSON records to an Amazon Kinesis data stream
//! - `MockSink`, capturing records (and injecting failures) for tests

pub mod error;
pub mod kinesis;
pub mod sink;

pub use error::SinkError;
pub use kinesis::{KinesisSink, SinkConfig, DEFAULT_MAX_ATTEMPTS, DEFAULT_PARTITION_KEY, DEFAULT_TIMEOUT_SECS};
pub use sink::{MockSink, PublishedRecord, RecordSink};
