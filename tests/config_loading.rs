use std::io::Write;

use tempfile::NamedTempFile;

use scriptmon::config::{load_and_validate, load_or_default};
use scriptmon::errors::ScriptmonError;

#[test]
fn full_config_file_is_loaded() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[catalog]
database = "data/catalog.db"

[monitor]
interpreter = "python3"
interpreter_args = ["-u"]
poll_interval_ms = 100
stop_grace_ms = 500

[ui]
max_log_lines = 10
"#
    )
    .unwrap();

    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.catalog.database.to_str(), Some("data/catalog.db"));
    assert_eq!(cfg.monitor.interpreter, "python3");
    assert_eq!(cfg.monitor.interpreter_args, vec!["-u".to_string()]);
    assert_eq!(cfg.monitor.poll_interval().as_millis(), 100);
    assert_eq!(cfg.monitor.stop_grace().as_millis(), 500);
    assert_eq!(cfg.ui.max_log_lines, 10);
    assert_eq!(cfg.ui.log_file.to_str(), Some("scriptmon.log"));
}

#[test]
fn out_of_range_poll_interval_returns_config_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "[monitor]\npoll_interval_ms = 0\n").unwrap();

    match load_and_validate(file.path()) {
        Err(ScriptmonError::ConfigError(msg)) => assert!(msg.contains("poll_interval_ms")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn unknown_keys_are_rejected_by_the_parser() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "[monitor]\ninterpeter = \"python\"\n").unwrap();

    assert!(matches!(
        load_and_validate(file.path()),
        Err(ScriptmonError::TomlError(_))
    ));
}

#[test]
fn explicitly_named_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");

    assert!(matches!(
        load_or_default(Some(missing.as_path())),
        Err(ScriptmonError::IoError(_))
    ));
}
