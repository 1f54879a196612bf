//! Precedence of configuration layers: defaults, file, environment, CLI.

use std::ffi::OsString;
use std::fs;
use std::sync::{Mutex, MutexGuard};

use rstest::{fixture, rstest};
use tempfile::TempDir;

use loom_config::{Config, LogFormat, default_log_filter, default_log_format};
use ortho_config::OrthoConfig;

/// Serialises tests that touch the process environment.
static ENV_LOCK: Mutex<()> = Mutex::new(());

const ENV_KEYS: &[&str] = &["LOOM_LOG_FILTER", "LOOM_LOG_FORMAT", "LOOM_SKIP_SYNTAX_CHECK"];

struct Harness {
    temp_dir: TempDir,
    args: Vec<OsString>,
    _lock: MutexGuard<'static, ()>,
}

impl Harness {
    fn new() -> Self {
        let lock = ENV_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        for key in ENV_KEYS {
            // SAFETY: ENV_LOCK serialises every test that touches these keys.
            unsafe { std::env::remove_var(key) };
        }
        Self {
            temp_dir: TempDir::new().expect("temporary directory"),
            args: vec![OsString::from("loom")],
            _lock: lock,
        }
    }

    fn write_config(&mut self, toml: &str) {
        let path = self.temp_dir.path().join("loom.toml");
        fs::write(&path, toml).expect("write configuration");
        self.args.push(OsString::from("--config-path"));
        self.args.push(path.into_os_string());
    }

    fn set_env(&self, key: &str, value: &str) {
        // SAFETY: ENV_LOCK serialises every test that touches these keys.
        unsafe { std::env::set_var(key, value) };
    }

    fn push_args(&mut self, args: &[&str]) {
        self.args.extend(args.iter().map(OsString::from));
    }

    fn load(&self) -> Config {
        Config::load_from_iter(self.args.clone())
            .unwrap_or_else(|error| panic!("configuration failed to load: {error}"))
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        for key in ENV_KEYS {
            // SAFETY: the lock guard is still held while the harness drops.
            unsafe { std::env::remove_var(key) };
        }
    }
}

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

#[rstest]
fn defaults_apply_without_overrides(harness: Harness) {
    let config = harness.load();
    assert_eq!(config.log_filter(), default_log_filter());
    assert_eq!(config.log_format(), default_log_format());
    assert!(config.verify_syntax());
    assert_eq!(config, Config::default());
}

#[rstest]
fn file_overrides_defaults(mut harness: Harness) {
    harness.write_config("log_filter = \"debug\"\nskip_syntax_check = true\n");
    let config = harness.load();
    assert_eq!(config.log_filter(), "debug");
    assert!(!config.verify_syntax());
}

#[rstest]
fn environment_overrides_file(mut harness: Harness) {
    harness.write_config("log_filter = \"debug\"\n");
    harness.set_env("LOOM_LOG_FILTER", "warn");
    harness.set_env("LOOM_LOG_FORMAT", "compact");
    let config = harness.load();
    assert_eq!(config.log_filter(), "warn");
    assert_eq!(config.log_format(), LogFormat::Compact);
}

#[rstest]
fn cli_overrides_environment(mut harness: Harness) {
    harness.write_config("log_filter = \"debug\"\n");
    harness.set_env("LOOM_LOG_FILTER", "warn");
    harness.push_args(&["--log-filter", "loom::weave=trace"]);
    let config = harness.load();
    assert_eq!(config.log_filter(), "loom::weave=trace");
}
