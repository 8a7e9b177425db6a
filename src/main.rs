//! hoarder CLI entry point
//!
//! Parses arguments, dispatches to the CLI module, reports errors as a JSON
//! line and exits non-zero on failure. All logic lives in `cli`.

use hoarder::cli;

fn main() {
    if let Err(e) = cli::run() {
        if cli::write_error(e.code_str(), e.message()).is_err() {
            eprintln!("{}", e);
        }
        std::process::exit(1);
    }
}
