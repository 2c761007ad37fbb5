//! The publish contract and its test double.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use forza_packet::TelemetryRecord;

use crate::error::SinkError;

/// Trait for publishing telemetry records to a named stream.
pub trait RecordSink: Send + Sync {
    /// Publish one record. Blocks until the sink accepts or rejects it.
    fn put_record(&self, record: &TelemetryRecord, stream_name: &str) -> Result<(), SinkError>;
}

/// A record accepted by `MockSink`.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedRecord {
    pub stream_name: String,
    pub record: TelemetryRecord,
}

/// Mock sink for testing that captures published records.
///
/// Clones share the captured records, so a test can keep a handle while
/// the loop under test owns another.
#[derive(Debug, Clone, Default)]
pub struct MockSink {
    published: Arc<RwLock<Vec<PublishedRecord>>>,
    failures_remaining: Arc<AtomicUsize>,
    always_fail: bool,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink that rejects every record.
    pub fn failing() -> Self {
        Self {
            always_fail: true,
            ..Self::default()
        }
    }

    /// Reject the next `count` records, then accept.
    pub fn fail_next(&self, count: usize) {
        self.failures_remaining.store(count, Ordering::SeqCst);
    }

    /// All accepted records, in publish order.
    pub fn published(&self) -> Vec<PublishedRecord> {
        self.published.read().unwrap().clone()
    }

    /// Accepted records without their stream names.
    pub fn records(&self) -> Vec<TelemetryRecord> {
        self.published().into_iter().map(|p| p.record).collect()
    }

    pub fn count(&self) -> usize {
        self.published.read().unwrap().len()
    }

    pub fn clear(&self) {
        self.published.write().unwrap().clear();
    }

    fn take_failure(&self) -> bool {
        self.always_fail
            || self
                .failures_remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
    }
}

impl RecordSink for MockSink {
    fn put_record(&self, record: &TelemetryRecord, stream_name: &str) -> Result<(), SinkError> {
        if self.take_failure() {
            return Err(SinkError::PutRecord {
                stream: stream_name.to_string(),
                message: "injected failure".to_string(),
            });
        }

        self.published.write().unwrap().push(PublishedRecord {
            stream_name: stream_name.to_string(),
            record: record.clone(),
        });
        Ok(())
    }
}
