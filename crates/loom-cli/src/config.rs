//! Configuration loading helpers for the loom CLI.
//!
//! Arguments destined for `ortho_config` are filtered out ahead of the
//! subcommand so the loader only sees flags it understands and clap only
//! sees the command tokens.

use std::ffi::{OsStr, OsString};

use loom_config::Config;
use ortho_config::OrthoConfig;

use crate::errors::AppError;

/// Configuration flags that take a value.
///
/// Kept in sync with the fields of [`Config`].
const CONFIG_VALUE_FLAGS: &[&str] = &["--config-path", "--log-filter", "--log-format"];

/// Configuration flags that take no value.
const CONFIG_SWITCH_FLAGS: &[&str] = &["--skip-syntax-check"];

pub(crate) trait ConfigLoader {
    /// Loads configuration for the CLI.
    ///
    /// # Flag Ordering
    ///
    /// Configuration flags must appear before the subcommand. Flags after it
    /// are parsed as subcommand arguments.
    fn load(&self, args: &[OsString]) -> Result<Config, AppError>;
}

pub(crate) struct OrthoConfigLoader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagAction {
    Include { needs_value: bool },
    Stop,
}

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, AppError> {
        Config::load_from_iter(args.iter().cloned()).map_err(AppError::LoadConfiguration)
    }
}

fn classify(argument: &OsStr) -> FlagAction {
    let text = argument.to_string_lossy();
    if !text.starts_with("--") {
        return FlagAction::Stop;
    }

    let (flag, inline_value) = text
        .split_once('=')
        .map_or((&*text, false), |(flag, _)| (flag, true));

    if CONFIG_VALUE_FLAGS.contains(&flag) {
        FlagAction::Include {
            needs_value: !inline_value,
        }
    } else if CONFIG_SWITCH_FLAGS.contains(&flag) {
        FlagAction::Include { needs_value: false }
    } else {
        FlagAction::Stop
    }
}

pub(crate) struct ConfigArgumentSplit {
    pub(crate) config_arguments: Vec<OsString>,
    pub(crate) command_arguments: Vec<OsString>,
}

/// Splits leading configuration flags from the command tokens.
///
/// The program name is kept at the front of both halves.
pub(crate) fn split_config_arguments(args: &[OsString]) -> ConfigArgumentSplit {
    let mut iter = args.iter();
    let Some(program) = iter.next() else {
        return ConfigArgumentSplit {
            config_arguments: Vec::new(),
            command_arguments: Vec::new(),
        };
    };

    let mut config_arguments = vec![program.clone()];
    let mut command_arguments = vec![program.clone()];
    let mut pending_value = false;

    for argument in iter.by_ref() {
        if pending_value {
            config_arguments.push(argument.clone());
            pending_value = false;
            continue;
        }
        match classify(argument) {
            FlagAction::Include { needs_value } => {
                config_arguments.push(argument.clone());
                pending_value = needs_value;
            }
            FlagAction::Stop => {
                command_arguments.push(argument.clone());
                break;
            }
        }
    }
    command_arguments.extend(iter.cloned());

    ConfigArgumentSplit {
        config_arguments,
        command_arguments,
    }
}
