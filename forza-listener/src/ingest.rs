//! Ingest loop: receive, decode, gate, forward.
//!
//! `Pipeline` holds the per-run state (field list, rate limiter, race
//! counter) and processes one datagram at a time. `run_ingest` drives it
//! from a `DatagramSource` until the source is exhausted, which a live
//! socket never is.

use std::io;

use forza_clock::Clock;
use forza_packet::{PacketDecoder, TelemetryRecord};
use forza_sink::RecordSink;

use crate::logger::{Level, Logger};
use crate::policy::{ForwardingPolicy, Mode, RaceEvent};
use crate::rate_limit::RateLimiter;
use crate::source::DatagramSource;

/// Receive buffer size. Longer datagrams are truncated.
pub const MAX_DATAGRAM_SIZE: usize = 1024;

/// Settings for one ingest run.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestConfig {
    pub mode: Mode,
    /// Minimum seconds between forwarded records; 0 disables the gate.
    pub limit_secs: f64,
    pub stream_name: String,
}

/// What happened to one datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Forwarded,
    Dropped,
    DecodeFailed,
    PublishFailed,
}

/// Counters for an ingest run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Datagrams received (including undecodable ones).
    pub received: u64,
    pub decode_failures: u64,
    pub forwarded: u64,
    /// Decoded but not forwarded (rate limit or race policy).
    pub dropped: u64,
    pub publish_failures: u64,
    pub receive_errors: u64,
}

impl IngestStats {
    fn record(&mut self, outcome: Outcome) {
        self.received += 1;
        match outcome {
            Outcome::Forwarded => self.forwarded += 1,
            Outcome::Dropped => self.dropped += 1,
            Outcome::DecodeFailed => self.decode_failures += 1,
            Outcome::PublishFailed => self.publish_failures += 1,
        }
    }

    /// One-line summary for the exit log.
    pub fn summary(&self) -> String {
        format!(
            "received={} forwarded={} dropped={} decode_failures={} publish_failures={} receive_errors={}",
            self.received,
            self.forwarded,
            self.dropped,
            self.decode_failures,
            self.publish_failures,
            self.receive_errors
        )
    }
}

/// Per-datagram processing state.
#[derive(Debug)]
pub struct Pipeline {
    decoder: PacketDecoder,
    fields: Vec<&'static str>,
    limiter: RateLimiter,
    policy: ForwardingPolicy,
    stream_name: String,
}

impl Pipeline {
    /// Create a pipeline. The field list is read from the decoder once.
    pub fn new(decoder: PacketDecoder, config: &IngestConfig) -> Self {
        let fields = decoder.available_fields();
        Self {
            decoder,
            fields,
            limiter: RateLimiter::new(config.limit_secs),
            policy: ForwardingPolicy::new(config.mode),
            stream_name: config.stream_name.clone(),
        }
    }

    pub fn fields(&self) -> &[&'static str] {
        &self.fields
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn policy(&self) -> &ForwardingPolicy {
        &self.policy
    }

    pub fn stream_name(&self) -> &str {
        &self.stream_name
    }

    /// Process one datagram.
    pub fn handle<C, S, L>(&mut self, datagram: &[u8], clock: &C, sink: &S, logger: &L) -> Outcome
    where
        C: Clock,
        S: RecordSink,
        L: Logger,
    {
        let packet = match self.decoder.decode(datagram) {
            Ok(packet) => packet,
            Err(e) => {
                logger.warn(&format!("failed to decode datagram: {}", e));
                return Outcome::DecodeFailed;
            }
        };

        let captured_at = clock.wall_clock();
        let now = clock.now_unix_secs();
        let race_active = packet.is_race_active();

        let record = match TelemetryRecord::capture(&packet, &self.fields, captured_at) {
            Ok(record) => record,
            Err(e) => {
                logger.warn(&format!("failed to read packet fields: {}", e));
                return Outcome::DecodeFailed;
            }
        };

        if logger.enabled(Level::Debug) {
            match record.to_json() {
                Ok(json) => logger.debug(&json),
                Err(e) => logger.warn(&format!("failed to encode record: {}", e)),
            }
        }

        let admitted = self.limiter.admit(now);
        let verdict = self.policy.evaluate(admitted, race_active);

        match verdict.event {
            Some(RaceEvent::Entered) => logger.info("entered race"),
            Some(RaceEvent::Left) => logger.info("left race"),
            _ => {}
        }

        if !verdict.is_forward() {
            return Outcome::Dropped;
        }

        let outcome = match sink.put_record(&record, &self.stream_name) {
            Ok(()) => Outcome::Forwarded,
            Err(e) => {
                logger.warn(&format!("failed to publish record: {}", e));
                Outcome::PublishFailed
            }
        };

        if let Some(RaceEvent::Progress(n)) = verdict.event {
            logger.info(&format!("logged {} packets", n));
        }

        outcome
    }
}

/// Run the ingest loop until `source` is exhausted.
pub fn run_ingest<D, C, S, L>(
    source: &mut D,
    pipeline: &mut Pipeline,
    clock: &C,
    sink: &S,
    logger: &L,
) -> IngestStats
where
    D: DatagramSource,
    C: Clock,
    S: RecordSink,
    L: Logger,
{
    let mut stats = IngestStats::default();
    let mut buf = [0u8; MAX_DATAGRAM_SIZE];

    loop {
        let len = match source.recv(&mut buf) {
            Ok(Some(len)) => len,
            Ok(None) => break,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                logger.warn(&format!("failed to receive datagram: {}", e));
                stats.receive_errors += 1;
                continue;
            }
        };

        let outcome = pipeline.handle(&buf[..len], clock, sink, logger);
        stats.record(outcome);
    }

    stats
}
