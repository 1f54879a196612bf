//! Command-line argument definitions for `loom`.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};

/// Weaves mod code into a patched script tree ahead of time.
#[derive(Parser, Debug)]
#[command(name = "loom", version, disable_help_subcommand = true)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum CliCommand {
    /// Applies a weave manifest to a patched tree and writes the woven tree.
    Weave {
        /// Root of the patched tree.
        #[arg(long, value_name = "DIR")]
        tree: Utf8PathBuf,
        /// JSON weave manifest.
        #[arg(long, value_name = "FILE")]
        manifest: Utf8PathBuf,
        /// Directory receiving the woven tree.
        #[arg(long, value_name = "DIR")]
        out: Utf8PathBuf,
    },
    /// Lists the binding paths a bundle exposes as weave targets.
    Targets {
        /// Root of the patched tree.
        #[arg(long, value_name = "DIR")]
        tree: Utf8PathBuf,
        /// Bundle path relative to the tree root.
        #[arg(long, value_name = "PATH")]
        bundle: Utf8PathBuf,
    },
}
