//! # oyster
//!
//! Replays a tap scenario against an Oyster card and prints the outcome of
//! every step. Run `oyster --help` for options.

use std::process::ExitCode;

use tracing::error;

fn main() -> ExitCode {
    oyster_cli::init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match oyster_cli::run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "Replay failed");
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
