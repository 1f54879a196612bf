//! CLI entrypoint for the loom weaving tool.
//!
//! The binary delegates to [`loom_cli::run`], which loads configuration,
//! initialises logging, and runs the requested subcommand.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    loom_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
