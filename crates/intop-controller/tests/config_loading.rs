//! Layered configuration loading from TOML files and the environment.

use std::env;
use std::io::Write;
use std::time::Duration;

use intop_controller::{OperatorConfig, load_config};
use tempfile::NamedTempFile;

fn write_config(config: &OperatorConfig) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .unwrap();
    let body = toml::to_string(config).unwrap();
    file.write_all(body.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_from_file_and_env() {
    let mut config = OperatorConfig::default();
    config.operator.id = Some("intop-a".into());
    config.probe.timeout_ms = 2500;
    config.probe.api_server_url = Some("https://10.0.0.1:6443".into());
    let file = write_config(&config);
    let path = file.path().to_str().unwrap();

    let loaded = load_config(Some(path)).unwrap();
    assert_eq!(loaded.operator.id.as_deref(), Some("intop-a"));
    assert_eq!(loaded.probe.timeout(), Duration::from_millis(2500));
    assert_eq!(loaded.logging.level, "info");

    // SAFETY: this is the only test of the binary touching the environment.
    unsafe { env::set_var("INTOP__LOGGING__LEVEL", "debug") };
    let overridden = load_config(Some(path));
    unsafe { env::remove_var("INTOP__LOGGING__LEVEL") };
    assert_eq!(overridden.unwrap().logging.level, "debug");
}

#[test]
fn test_invalid_file_is_rejected() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .unwrap();
    file.write_all(b"[probe]\ntimeout_ms = 0\n").unwrap();

    let err = load_config(file.path().to_str()).unwrap_err();
    assert!(err.contains("timeout_ms"));
}
