//! Listen command orchestration.
//!
//! Startup helpers open the log mirror, connect the sink, and bind the
//! socket; any failure there is fatal. `execute_listen` then runs the
//! ingest loop, which only returns once the source is exhausted.

use forza_clock::Clock;
use forza_packet::PacketDecoder;
use forza_sink::{KinesisSink, RecordSink};

use crate::cli::Cli;
use crate::ingest::{run_ingest, IngestStats, Pipeline};
use crate::logger::{Logger, StderrLogger};
use crate::source::{DatagramSource, UdpSource};

use super::{CommandError, CommandResult};

/// Open the stderr logger mirrored to `--output-filename`.
pub fn open_logger(cli: &Cli) -> CommandResult<StderrLogger> {
    StderrLogger::with_mirror(cli.verbosity(), &cli.output_filename).map_err(|source| {
        CommandError::LogFile {
            path: cli.output_filename.clone(),
            source,
        }
    })
}

/// Build the Kinesis sink and, unless skipped, check the stream exists.
pub fn connect_sink<L: Logger>(cli: &Cli, logger: &L) -> CommandResult<KinesisSink> {
    let sink = KinesisSink::new(&cli.sink_config())?;

    if cli.skip_stream_check {
        logger.debug("skipping stream check");
    } else {
        sink.verify_stream(&cli.stream_name)?;
        logger.debug(&format!("stream '{}' is available", cli.stream_name));
    }

    Ok(sink)
}

/// Bind the UDP socket on all interfaces.
pub fn bind_source(port: u16) -> CommandResult<UdpSource> {
    UdpSource::bind(port).map_err(|source| CommandError::Bind { port, source })
}

/// Execute the listen command.
///
/// With a live socket this never returns; a finite source ends the run and
/// yields its statistics.
pub fn execute_listen<D, C, S, L>(
    cli: &Cli,
    source: &mut D,
    clock: &C,
    sink: &S,
    logger: &L,
) -> CommandResult<IngestStats>
where
    D: DatagramSource,
    C: Clock,
    S: RecordSink,
    L: Logger,
{
    cli.validate()?;

    let decoder = PacketDecoder::new(cli.packet_format);
    let mut pipeline = Pipeline::new(decoder, &cli.ingest_config());

    if pipeline.fields().is_empty() {
        logger.warn("packet format exposes no fields; records carry only a timestamp");
    }

    logger.debug(&format!(
        "mode={} limit={}s format={} stream={} fields={}",
        cli.mode,
        cli.limit,
        cli.packet_format,
        cli.stream_name,
        pipeline.fields().len()
    ));
    logger.info(&format!("PORT {} LISTEN", cli.port));

    let stats = run_ingest(source, &mut pipeline, clock, sink, logger);

    logger.info(&format!("ingest stopped: {}", stats.summary()));
    Ok(stats)
}
