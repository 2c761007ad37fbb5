//! forza-listener binary.
//!
//! Entry point for the `forza-listener` command-line tool.

use std::process::ExitCode;

use clap::Parser;
use forza_clock::SystemClock;
use forza_listener::commands::{bind_source, connect_sink, open_logger};
use forza_listener::exit::{codes, exit_code};
use forza_listener::{execute_listen, Cli, CommandError};

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::from(codes::SUCCESS),
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

/// Start up and run the ingest loop. Returns only on a startup failure.
fn run(cli: &Cli) -> Result<(), CommandError> {
    cli.validate()?;

    let logger = open_logger(cli)?;
    let sink = connect_sink(cli, &logger)?;
    let mut source = bind_source(cli.port)?;

    execute_listen(cli, &mut source, &SystemClock, &sink, &logger)?;
    Ok(())
}
