//! Binary entrypoint for the `tracksync` service.

use std::process::ExitCode;

fn main() -> ExitCode {
    // Recording is handled in commands::dispatch via TRACKSYNC_RECORD=<dir>.
    match tracksync::run(std::env::args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
