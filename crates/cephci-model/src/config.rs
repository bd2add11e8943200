use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::{Flag, ModelError, TimeoutMs};

pub const ENV_RUN_ID: &str = "CEPHCI_RUN_ID";
pub const ENV_RUN_DIR: &str = "CEPHCI_RUN_DIR";
pub const ENV_DISABLE_CONSOLE: &str = "CEPHCI_DISABLE_CONSOLE";
pub const ENV_LOG_LEVEL: &str = "CEPHCI_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "CEPHCI_LOG_FORMAT";
pub const ENV_MAX_WORKERS: &str = "CEPHCI_MAX_WORKERS";
pub const ENV_COMMAND_TIMEOUT_MS: &str = "CEPHCI_COMMAND_TIMEOUT_MS";

/// Settings for one harness run.
///
/// Built once at startup and handed by reference to whatever needs it
/// (logger setup, node execution, parallel fan-out).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunConfig {
    pub run_id: String,
    /// Directory receiving the run's log files.
    pub run_dir: PathBuf,
    pub disable_console: bool,
    /// Tracing filter directive (`info`, `debug`, `cephci_exec=trace`, ...).
    pub log_level: String,
    /// `text` or `json`.
    pub log_format: String,
    /// Upper bound for parallel workers. `None` means one worker per task.
    pub max_workers: Option<usize>,
    pub command_timeout_ms: TimeoutMs,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            run_id: "local".to_string(),
            run_dir: PathBuf::from("/tmp/cephci"),
            disable_console: false,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            max_workers: None,
            command_timeout_ms: 600_000,
        }
    }
}

impl RunConfig {
    /// Defaults overlaid with `CEPHCI_*` environment variables.
    pub fn from_env() -> Result<Self, ModelError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns for the `CEPHCI_*` keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ModelError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        cfg.overlay(lookup)?;
        Ok(cfg)
    }

    /// Reads a JSON run config file. Missing keys keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Applies `CEPHCI_*` overrides on top of the current values.
    pub fn overlay<F>(&mut self, lookup: F) -> Result<(), ModelError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_RUN_ID) {
            self.run_id = v;
        }
        if let Some(v) = lookup(ENV_RUN_DIR) {
            self.run_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup(ENV_DISABLE_CONSOLE) {
            self.disable_console = parse::<Flag>(ENV_DISABLE_CONSOLE, v)?.is_enabled();
        }
        if let Some(v) = lookup(ENV_LOG_LEVEL) {
            self.log_level = v;
        }
        if let Some(v) = lookup(ENV_LOG_FORMAT) {
            self.log_format = v;
        }
        if let Some(v) = lookup(ENV_MAX_WORKERS) {
            let n = parse::<usize>(ENV_MAX_WORKERS, v.clone())?;
            if n == 0 {
                return Err(invalid(ENV_MAX_WORKERS, v));
            }
            self.max_workers = Some(n);
        }
        if let Some(v) = lookup(ENV_COMMAND_TIMEOUT_MS) {
            self.command_timeout_ms = parse::<TimeoutMs>(ENV_COMMAND_TIMEOUT_MS, v)?;
        }
        Ok(())
    }
}

fn parse<T: FromStr>(key: &str, value: String) -> Result<T, ModelError> {
    value.trim().parse::<T>().map_err(|_| invalid(key, value))
}

fn invalid(key: &str, value: String) -> ModelError {
    ModelError::InvalidEnv {
        key: key.to_string(),
        value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let cfg = RunConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg, RunConfig::default());
    }

    #[test]
    fn environment_overrides_apply() {
        let cfg = RunConfig::from_lookup(lookup(&[
            (ENV_RUN_ID, "run-42"),
            (ENV_RUN_DIR, "/var/log/cephci/run-42"),
            (ENV_DISABLE_CONSOLE, "yes"),
            (ENV_LOG_LEVEL, "debug"),
            (ENV_MAX_WORKERS, "8"),
            (ENV_COMMAND_TIMEOUT_MS, "1500"),
        ]))
        .unwrap();

        assert_eq!(cfg.run_id, "run-42");
        assert_eq!(cfg.run_dir, PathBuf::from("/var/log/cephci/run-42"));
        assert!(cfg.disable_console);
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.max_workers, Some(8));
        assert_eq!(cfg.command_timeout_ms, 1500);
    }

    #[test]
    fn invalid_values_are_reported_with_key() {
        let err = RunConfig::from_lookup(lookup(&[(ENV_MAX_WORKERS, "lots")])).unwrap_err();
        match err {
            ModelError::InvalidEnv { key, value } => {
                assert_eq!(key, ENV_MAX_WORKERS);
                assert_eq!(value, "lots");
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(RunConfig::from_lookup(lookup(&[(ENV_MAX_WORKERS, "0")])).is_err());
        assert!(RunConfig::from_lookup(lookup(&[(ENV_DISABLE_CONSOLE, "sometimes")])).is_err());
    }

    #[test]
    fn load_keeps_defaults_for_missing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        fs::write(&path, r#"{"runId":"nightly","maxWorkers":4}"#).unwrap();

        let cfg = RunConfig::load(&path).unwrap();
        assert_eq!(cfg.run_id, "nightly");
        assert_eq!(cfg.max_workers, Some(4));
        assert_eq!(cfg.log_level, "info");
    }
}
