//! Command-line runtime for the loom weaving tool.
//!
//! The runtime splits configuration flags from the subcommand, loads
//! layered configuration, installs structured logging, and then either
//! weaves a patched tree or lists the weave targets of one bundle. IO
//! streams and the configuration loader are injected so tests can drive it
//! without a process boundary.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use camino::Utf8Path;
use clap::Parser;
use loom_config::Config;
use loom_core::{WeaveOptions, apply_manifest};
use tracing::info;

mod cli;
mod config;
mod errors;
mod telemetry;
mod tree_io;

use cli::{Cli, CliCommand};
use config::{ConfigLoader, OrthoConfigLoader, split_config_arguments};
use errors::AppError;

/// Runs the CLI with the given arguments and output streams.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with_loader(args, stdout, stderr, &OrthoConfigLoader)
}

fn run_with_loader<I, W, E, L>(args: I, stdout: &mut W, stderr: &mut E, loader: &L) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let arguments: Vec<OsString> = args.into_iter().collect();
    let split = split_config_arguments(&arguments);

    let result = Cli::try_parse_from(&split.command_arguments)
        .map_err(AppError::CliUsage)
        .and_then(|cli| {
            loader
                .load(&split.config_arguments)
                .map(|loaded| (cli, loaded))
        })
        .and_then(|(cli, loaded)| {
            telemetry::initialise(&loaded)?;
            execute(&cli.command, &loaded, stdout)
        });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        // Help and version output are successful requests.
        Err(AppError::CliUsage(usage)) if !usage.use_stderr() => {
            write!(stdout, "{usage}").map_or(ExitCode::FAILURE, |()| ExitCode::SUCCESS)
        }
        Err(error) => {
            writeln!(stderr, "{error}").ok();
            ExitCode::FAILURE
        }
    }
}

fn execute<W: Write>(
    command: &CliCommand,
    config: &Config,
    stdout: &mut W,
) -> Result<(), AppError> {
    match command {
        CliCommand::Weave {
            tree,
            manifest,
            out,
        } => weave(tree, manifest, out, config, stdout),
        CliCommand::Targets { tree, bundle } => list_targets(tree, bundle, stdout),
    }
}

fn weave<W: Write>(
    tree_root: &Utf8Path,
    manifest_path: &Utf8Path,
    out: &Utf8Path,
    config: &Config,
    stdout: &mut W,
) -> Result<(), AppError> {
    let mut tree = tree_io::read_tree(tree_root)?;
    let manifest = tree_io::read_manifest(manifest_path)?;
    let options = WeaveOptions {
        verify_syntax: config.verify_syntax(),
    };
    let report = apply_manifest(&mut tree, &manifest, options)?;
    tree_io::write_tree(out, &tree)?;
    info!(out = %out, files = tree.len(), "woven tree written");

    writeln!(
        stdout,
        "wove {} weaves across {} bundles",
        report.weave_count(),
        report.bundle_count()
    )
    .map_err(AppError::WriteOutput)
}

fn list_targets<W: Write>(
    tree_root: &Utf8Path,
    bundle_path: &Utf8Path,
    stdout: &mut W,
) -> Result<(), AppError> {
    let tree = tree_io::read_file(tree_root, bundle_path)?;
    let bundle = tree.open_bundle(bundle_path)?;
    for target in bundle.targets()? {
        writeln!(stdout, "{target}").map_err(AppError::WriteOutput)?;
    }
    Ok(())
}
