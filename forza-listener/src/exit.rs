//! Exit codes for the forza-listener binary.
//!
//! Only startup failures exit non-zero; the ingest loop itself never fails.

use crate::commands::CommandError;

/// Exit code constants.
pub mod codes {
    /// Successful execution.
    pub const SUCCESS: u8 = 0;
    /// Invalid arguments.
    pub const INVALID_ARGS: u8 = 1;
    /// Log file could not be opened.
    pub const IO_ERROR: u8 = 2;
    /// Sink construction or stream verification failed.
    pub const SINK_ERROR: u8 = 3;
    /// UDP port could not be bound.
    pub const BIND_ERROR: u8 = 4;
}

/// Map a CommandError to an exit code.
pub fn exit_code(error: &CommandError) -> u8 {
    match error {
        CommandError::InvalidArgument(_) => codes::INVALID_ARGS,
        CommandError::LogFile { .. } => codes::IO_ERROR,
        CommandError::Sink(_) => codes::SINK_ERROR,
        CommandError::Bind { .. } => codes::BIND_ERROR,
    }
}
