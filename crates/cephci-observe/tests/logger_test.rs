use std::{
    fs, io,
    sync::{Arc, Mutex},
};

use cephci_observe::{
    Log, LoggerConfig, LoggerError, LoggerFormat, Payload, logger_build, logger_build_with_console,
};
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
struct Console(Arc<Mutex<Vec<u8>>>);

impl io::Write for Console {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Console {
    type Writer = Console;
    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

impl Console {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

fn file_config(dir: &std::path::Path) -> LoggerConfig {
    LoggerConfig {
        log_dir: Some(dir.to_path_buf()),
        disable_console: true,
        level: "debug".into(),
        ..LoggerConfig::default()
    }
}

#[test]
fn writes_full_and_error_logs_redacted() {
    let dir = tempfile::tempdir().unwrap();
    let handle = logger_build("startup", &file_config(dir.path())).unwrap();
    let log_file = handle.log_file().unwrap().to_path_buf();
    let error_file = handle.error_file().unwrap().to_path_buf();

    assert_eq!(log_file, dir.path().join("startup.log"));
    assert_eq!(error_file, dir.path().join("startup.err"));

    let log = Log::new("startup");
    tracing::subscriber::with_default(handle.into_subscriber(), || {
        log.info("This has password something.");
        log.debug(Payload::map([
            ("password", Payload::from("Should be masked")),
            ("age", Payload::Int(10)),
        ]));
        log.error("deploy failed with token=abc123");
        tracing::warn!(access_key = "AKIA5555", "raw tracing event");
    });

    let full = fs::read_to_string(&log_file).unwrap();
    assert!(full.contains("This has password <masked>"), "{full}");
    assert!(full.contains(r#"{"password": "<masked>", "age": 10}"#), "{full}");
    assert!(full.contains("token=<masked>"), "{full}");
    assert!(full.contains("raw tracing event"), "{full}");
    assert!(!full.contains("something."), "{full}");
    assert!(!full.contains("Should be masked"), "{full}");
    assert!(!full.contains("abc123"), "{full}");
    assert!(!full.contains("AKIA5555"), "{full}");

    let errors = fs::read_to_string(&error_file).unwrap();
    assert_eq!(errors.lines().count(), 1, "{errors}");
    assert!(errors.contains("deploy failed with token=<masked>"), "{errors}");
}

#[test]
fn level_filter_applies_to_full_log() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = LoggerConfig {
        level: "warn".into(),
        ..file_config(dir.path())
    };
    let handle = logger_build("quiet", &cfg).unwrap();
    let log_file = handle.log_file().unwrap().to_path_buf();

    tracing::subscriber::with_default(handle.into_subscriber(), || {
        tracing::info!("not written");
        tracing::warn!("written");
    });

    let full = fs::read_to_string(&log_file).unwrap();
    assert!(!full.contains("not written"), "{full}");
    assert!(full.contains("written"), "{full}");
}

#[test]
fn json_format_stays_parseable() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = LoggerConfig {
        format: LoggerFormat::Json,
        ..file_config(dir.path())
    };
    let handle = logger_build("structured", &cfg).unwrap();
    let log_file = handle.log_file().unwrap().to_path_buf();

    tracing::subscriber::with_default(handle.into_subscriber(), || {
        tracing::info!(password = "hunter2", "login");
    });

    let full = fs::read_to_string(&log_file).unwrap();
    let line = full.lines().next().unwrap();
    let value: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(value["fields"]["password"], "<masked>");
    assert_eq!(value["fields"]["message"], "login");
}

#[test]
fn no_directory_means_no_files() {
    let cfg = LoggerConfig {
        disable_console: true,
        ..LoggerConfig::default()
    };
    let handle = logger_build("console-only", &cfg).unwrap();
    assert!(handle.log_file().is_none());
    assert!(handle.error_file().is_none());
}

#[test]
fn invalid_level_is_rejected() {
    let cfg = LoggerConfig {
        level: "cephci=verbose".into(),
        ..LoggerConfig::default()
    };
    assert!(matches!(
        logger_build("bad", &cfg),
        Err(LoggerError::InvalidLogLevel(_))
    ));
}

#[test]
fn empty_name_is_rejected() {
    assert!(matches!(
        logger_build(" ", &LoggerConfig::default()),
        Err(LoggerError::InitializationFailed(_))
    ));
}

fn console_output(use_color: bool) -> String {
    let console = Console::default();
    let cfg = LoggerConfig {
        use_color,
        level: "debug".into(),
        ..LoggerConfig::default()
    };
    let handle = logger_build_with_console("console", &cfg, console.clone()).unwrap();
    assert!(handle.log_file().is_none());

    let log = Log::new("console");
    tracing::subscriber::with_default(handle.into_subscriber(), || {
        tracing::info!(token = "abc123", password = "hunter2", "login");
        tracing::warn!(access_key = "AKIA5555", keyring = "AQBxyz", "rgw user created");
        log.info("mounted with password s3cr3t");
    });
    console.text()
}

#[test]
fn console_is_redacted_without_colour() {
    let out = console_output(false);
    assert!(out.contains("login"), "{out}");
    assert!(out.contains(r#"token="<masked>""#), "{out}");
    assert!(out.contains("password <masked>"), "{out}");
    for secret in ["abc123", "hunter2", "AKIA5555", "AQBxyz", "s3cr3t"] {
        assert!(!out.contains(secret), "{secret} leaked: {out}");
    }
}

#[test]
fn console_is_redacted_with_colour() {
    let out = console_output(true);
    assert!(out.contains('\x1b'), "{out:?}");
    assert!(out.contains("rgw user created"), "{out:?}");
    assert!(out.contains("<masked>"), "{out:?}");
    for secret in ["abc123", "hunter2", "AKIA5555", "AQBxyz", "s3cr3t"] {
        assert!(!out.contains(secret), "{secret} leaked: {out:?}");
    }
}
