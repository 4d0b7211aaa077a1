use mdml_streams::mdml::config::{
    ENV_AUTO_OFFSET_RESET, ENV_BROKERS, ENV_CLIENT_ID, ENV_CONFIG, ENV_GROUP_ID,
    ENV_REQUEST_TIMEOUT_MS, ENV_SCHEMA_REGISTRY_PASSWORD, ENV_SCHEMA_REGISTRY_TOKEN,
    ENV_SCHEMA_REGISTRY_URL, ENV_SCHEMA_REGISTRY_USERNAME,
};
use mdml_streams::{ClientSettings, MdmlError, OffsetReset};
use serial_test::serial;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

const ALL_VARS: [&str; 10] = [
    ENV_BROKERS,
    ENV_SCHEMA_REGISTRY_URL,
    ENV_SCHEMA_REGISTRY_USERNAME,
    ENV_SCHEMA_REGISTRY_PASSWORD,
    ENV_SCHEMA_REGISTRY_TOKEN,
    ENV_CLIENT_ID,
    ENV_GROUP_ID,
    ENV_REQUEST_TIMEOUT_MS,
    ENV_AUTO_OFFSET_RESET,
    ENV_CONFIG,
];

fn clear_env() {
    for name in ALL_VARS {
        std::env::remove_var(name);
    }
}

fn settings_file(yaml: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn test_load_without_file_uses_defaults() {
    clear_env();
    let settings = ClientSettings::load(None).unwrap();
    assert_eq!(settings, ClientSettings::default());
}

#[test]
#[serial]
fn test_file_then_environment() {
    clear_env();
    let file = settings_file(
        "brokers:\n  - \"kafka-1:9092\"\n  - \"kafka-2:9092\"\nclient_id: lab-client\ngroup_id: from-file\nrequest_timeout_ms: 5000\n",
    );
    std::env::set_var(ENV_GROUP_ID, "from-env");

    let settings = ClientSettings::load(Some(file.path())).unwrap();
    clear_env();

    assert_eq!(settings.brokers.bootstrap_servers(), "kafka-1:9092,kafka-2:9092");
    assert_eq!(settings.client_id, "lab-client");
    assert_eq!(settings.group_id, "from-env");
    assert_eq!(settings.request_timeout(), Duration::from_secs(5));
    assert_eq!(settings.registry_url(), "http://kafka-1:8081");
}

#[test]
#[serial]
fn test_config_path_from_environment() {
    clear_env();
    let file = settings_file(
        "auto_offset_reset: latest\nschema_registry_url: \"http://registry:18081\"\n",
    );
    std::env::set_var(ENV_CONFIG, file.path());

    let settings = ClientSettings::load(None).unwrap();
    clear_env();

    assert_eq!(settings.auto_offset_reset, OffsetReset::Latest);
    assert_eq!(settings.registry_url(), "http://registry:18081");
}

#[test]
#[serial]
fn test_invalid_environment_is_config_error() {
    clear_env();
    std::env::set_var(ENV_BROKERS, "broker-without-port");

    let result = ClientSettings::load(None);
    clear_env();

    assert!(matches!(result, Err(MdmlError::Config { .. })));
}

#[test]
#[serial]
fn test_missing_file_is_config_error() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.yaml");

    let err = ClientSettings::load(Some(&missing)).unwrap_err();
    assert!(matches!(err, MdmlError::Config { ref message } if message.contains("absent.yaml")));
}

#[test]
#[serial]
fn test_malformed_file_names_the_path() {
    clear_env();
    let file = settings_file("brokers: \"not-a-list\"\n");

    let err = ClientSettings::load(Some(file.path())).unwrap_err();
    let path = file.path().display().to_string();
    assert!(matches!(err, MdmlError::Config { ref message } if message.contains(&path)));
}
