use std::path::PathBuf;

use cephci_model::RunConfig;
use tracing::{debug, error, info, warn};

use crate::{
    logger::{LoggerConfig, LoggerError, logger_init},
    redact::{Payload, SensitiveFilter},
};

/// Named logger for test modules.
///
/// Every payload is redacted before it is emitted, so structured values (config
/// mappings, command argument lists) can be logged as is.
#[derive(Debug, Clone)]
pub struct Log {
    name: String,
    filter: SensitiveFilter,
}

impl Log {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filter: SensitiveFilter::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Installs the process-wide pipeline with this logger's name for the log files.
    pub fn configure(&self, cfg: &LoggerConfig) -> Result<Option<PathBuf>, LoggerError> {
        logger_init(&self.name, cfg)
    }

    /// Creates the logger and installs the pipeline for `run` in one step.
    pub fn from_run_config(name: impl Into<String>, run: &RunConfig) -> Result<Self, LoggerError> {
        let log = Self::new(name);
        log.configure_run(run)?;
        Ok(log)
    }

    /// Same as [`Log::configure`], with settings taken from the run configuration.
    pub fn configure_run(&self, run: &RunConfig) -> Result<Option<PathBuf>, LoggerError> {
        self.configure(&LoggerConfig::from_run(run)?)
    }

    /// Redacted rendition of `payload` as it would be written.
    pub fn render(&self, payload: impl Into<Payload>) -> String {
        self.filter.redact(&payload.into()).to_string()
    }

    pub fn debug(&self, payload: impl Into<Payload>) {
        let msg = self.render(payload);
        debug!(logger = %self.name, "{msg}");
    }

    pub fn info(&self, payload: impl Into<Payload>) {
        let msg = self.render(payload);
        info!(logger = %self.name, "{msg}");
    }

    pub fn warning(&self, payload: impl Into<Payload>) {
        let msg = self.render(payload);
        warn!(logger = %self.name, "{msg}");
    }

    pub fn error(&self, payload: impl Into<Payload>) {
        let msg = self.render(payload);
        error!(logger = %self.name, "{msg}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_masks_structured_payload() {
        let log = Log::new("test_rgw");
        let creds = Payload::map([
            ("user", Payload::from("rgw-admin")),
            ("access_key", Payload::from("AKIAXXXX")),
        ]);
        assert_eq!(
            log.render(creds.clone()),
            r#"{"user": "rgw-admin", "access_key": "<masked>"}"#
        );
        assert_eq!(creds.get("access_key"), Some(&Payload::from("AKIAXXXX")));
    }

    #[test]
    fn render_masks_plain_message() {
        let log = Log::new("test_rbd");
        assert_eq!(log.render("mapped with keyring=AQB"), "mapped with keyring=<masked>");
        assert_eq!(log.name(), "test_rbd");
    }
}
