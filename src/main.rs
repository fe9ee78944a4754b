//! Binary entrypoint for the `mangabridge` CLI.

use std::process::ExitCode;

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    mangabridge::logging::init();

    // Recording and replay are handled in commands::dispatch via
    // MANGABRIDGE_RECORD=<dir> and MANGABRIDGE_REPLAY=<dir>.
    match mangabridge::run(std::env::args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
