//! Integration tests for configuration loading.
//!
//! These tests touch process environment variables and run serially.

use std::env;
use std::fs;
use std::path::PathBuf;

use licensor::{LicenseError, LicenseLevel, LicensorConfig, ManagerConfig};
use serial_test::serial;

const ENV_VARS: [&str; 9] = [
    "LICENSOR_KEY_DIR",
    "LICENSOR_KEY_SCHEME",
    "LICENSOR_KEY_BITS",
    "LICENSOR_ISSUER_ID",
    "LICENSOR_LICENSE_VERSION",
    "LICENSOR_DEFAULT_DAYS",
    "LICENSOR_DEFAULT_LEVEL",
    "LICENSOR_LOGGING_ENABLED",
    "LICENSOR_LOG_LEVEL",
];

fn clear_env() {
    for var in ENV_VARS {
        env::remove_var(var);
    }
}

fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("licensor.toml");
    fs::write(&path, contents).unwrap();
    (dir, path)
}

#[test]
#[serial]
fn load_without_file_uses_defaults() {
    clear_env();

    let config = LicensorConfig::load().expect("defaults should load");
    assert_eq!(config.keys.scheme, "rsa");
    assert_eq!(config.keys.bits, 2048);
    assert_eq!(config.license.default_days, 365);
    assert_eq!(config.license.default_level().unwrap(), LicenseLevel::Basic);
    assert!(!config.logging.enabled);
    assert!(config.tiers.is_empty());
}

#[test]
#[serial]
fn file_values_override_defaults() {
    clear_env();
    let (_dir, path) = write_config(
        r#"
[keys]
dir = "/srv/licensor"
bits = 3072

[license]
issuer_id = "acme"
default_days = 90
default_level = "professional"

[logging]
enabled = true
level = "debug"

[tiers.professional]
features = ["export", "sync"]
"#,
    );

    let config = LicensorConfig::load_from(&path).unwrap();
    assert_eq!(config.keys.dir, PathBuf::from("/srv/licensor"));
    assert_eq!(config.keys.bits, 3072);
    assert_eq!(config.keys.private_key_file, "private.pem");
    assert_eq!(config.license.issuer_id, "acme");
    assert_eq!(config.license.default_days, 90);
    assert_eq!(
        config.license.default_level().unwrap(),
        LicenseLevel::Professional
    );
    assert!(config.logging.enabled);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(
        config.tiers["professional"].features,
        vec!["export".to_string(), "sync".to_string()]
    );

    let manager_config = ManagerConfig::from(&config);
    assert_eq!(
        manager_config.public_key_path,
        PathBuf::from("/srv/licensor").join("public.pem")
    );
    assert_eq!(manager_config.key_bits, 3072);
    assert_eq!(manager_config.issuer_id, "acme");
}

#[test]
#[serial]
fn env_overrides_file() {
    clear_env();
    let (_dir, path) = write_config(
        r#"
[license]
issuer_id = "from-file"
default_days = 90
"#,
    );

    env::set_var("LICENSOR_ISSUER_ID", "from-env");
    env::set_var("LICENSOR_DEFAULT_DAYS", "7");
    env::set_var("LICENSOR_KEY_SCHEME", "ed25519");

    let config = LicensorConfig::load_from(&path);
    clear_env();
    let config = config.unwrap();

    assert_eq!(config.license.issuer_id, "from-env");
    assert_eq!(config.license.default_days, 7);
    assert_eq!(config.keys.scheme, "ed25519");
}

#[test]
#[serial]
fn explicit_file_must_exist() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();

    let result = LicensorConfig::load_from(&dir.path().join("absent.toml"));
    assert!(matches!(result, Err(LicenseError::ConfigError(_))));
}

#[test]
#[serial]
fn invalid_values_are_rejected() {
    clear_env();

    let (_dir, path) = write_config("[keys]\nbits = 1024\n");
    assert!(matches!(
        LicensorConfig::load_from(&path),
        Err(LicenseError::ConfigError(_))
    ));

    let (_dir, path) = write_config("[tiers.gold]\nfeatures = []\n");
    assert!(matches!(
        LicensorConfig::load_from(&path),
        Err(LicenseError::ConfigError(_))
    ));

    let (_dir, path) = write_config("[license]\ndefault_level = \"platinum\"\n");
    assert!(matches!(
        LicensorConfig::load_from(&path),
        Err(LicenseError::ConfigError(_))
    ));
}

#[test]
#[serial]
fn invalid_env_value_is_rejected() {
    clear_env();
    env::set_var("LICENSOR_LOG_LEVEL", "shouting");

    let result = LicensorConfig::load();
    clear_env();

    assert!(matches!(result, Err(LicenseError::ConfigError(_))));
}
