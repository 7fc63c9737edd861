//! Settle - declarative configuration management

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = settle_cli::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
