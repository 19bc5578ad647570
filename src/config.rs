//! Configuration for the licensing tool.
//!
//! Configuration is loaded from multiple sources with the following precedence:
//! 1. Environment variables (highest priority)
//! 2. `licensor.toml` in the working directory, or an explicit file
//! 3. Default values (lowest priority)
//!
//! There is no global instance: load a [`LicensorConfig`] once at startup and
//! hand the parts each component needs to it explicitly.
//!
//! # Environment Variables
//!
//! - `LICENSOR_KEY_DIR` - Directory holding the key pair
//! - `LICENSOR_KEY_SCHEME` - Signature scheme (`rsa`, `ed25519`)
//! - `LICENSOR_KEY_BITS` - RSA modulus size for new keys
//! - `LICENSOR_ISSUER_ID` - Issuer ID stamped on new licenses
//! - `LICENSOR_LICENSE_VERSION` - Version stamped on new licenses
//! - `LICENSOR_DEFAULT_DAYS` - Validity period when none is given
//! - `LICENSOR_DEFAULT_LEVEL` - Level when none is given
//! - `LICENSOR_LOGGING_ENABLED` - Enable log output
//! - `LICENSOR_LOG_LEVEL` - Log level (trace, debug, info, warn, error)

use config::{Config, ConfigError};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use crate::errors::{LicenseError, LicenseResult};
use crate::license::{LicenseLevel, DEFAULT_LICENSE_VERSION};
use crate::scheme::{DEFAULT_KEY_BITS, MIN_RSA_BITS};
use crate::tiers::{validate_tiers, TierConfig};

/// Config file looked up in the working directory (any supported extension).
const DEFAULT_CONFIG_NAME: &str = "licensor";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LicensorConfig {
    /// Key pair location and generation settings
    pub keys: KeysConfig,
    /// Defaults for newly issued licenses
    pub license: LicenseConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Feature sets per license level
    pub tiers: HashMap<String, TierConfig>,
}

/// Key pair configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KeysConfig {
    /// Directory containing the key files
    pub dir: PathBuf,
    /// Private key file name inside `dir`
    pub private_key_file: String,
    /// Public key file name inside `dir`
    pub public_key_file: String,
    /// Signature scheme: "rsa" or "ed25519"
    pub scheme: String,
    /// RSA modulus size for generated keys
    pub bits: usize,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            dir: default_key_dir(),
            private_key_file: "private.pem".to_string(),
            public_key_file: "public.pem".to_string(),
            scheme: "rsa".to_string(),
            bits: DEFAULT_KEY_BITS,
        }
    }
}

impl KeysConfig {
    pub fn private_key_path(&self) -> PathBuf {
        self.dir.join(&self.private_key_file)
    }

    pub fn public_key_path(&self) -> PathBuf {
        self.dir.join(&self.public_key_file)
    }
}

/// Defaults applied when issuing licenses.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LicenseConfig {
    /// Issuer identifier written into every license
    pub issuer_id: String,
    /// License format version written into every license
    pub version: String,
    /// Validity period in days when the caller gives none
    pub default_days: u32,
    /// Level when the caller gives none
    pub default_level: String,
}

impl Default for LicenseConfig {
    fn default() -> Self {
        Self {
            issuer_id: String::new(),
            version: DEFAULT_LICENSE_VERSION.to_string(),
            default_days: 365,
            default_level: LicenseLevel::Basic.to_string(),
        }
    }
}

impl LicenseConfig {
    pub fn default_level(&self) -> LicenseResult<LicenseLevel> {
        self.default_level.parse().map_err(|_| {
            LicenseError::ConfigError(format!(
                "license.default_level must be basic, professional or enterprise. Got '{}'",
                self.default_level
            ))
        })
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Enable logging
    pub enabled: bool,
    /// Log level: trace, debug, info, warn, error
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: "info".to_string(),
        }
    }
}

/// `~/.licensor`, or `./.licensor` if there is no home directory.
fn default_key_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".licensor")
}

fn config_error(e: ConfigError) -> LicenseError {
    LicenseError::ConfigError(e.to_string())
}

impl LicensorConfig {
    /// Load defaults, then an optional `licensor.toml`, then environment variables.
    pub fn load() -> LicenseResult<Self> {
        Self::build(None)
    }

    /// Load defaults, then the given file (which must exist), then environment variables.
    pub fn load_from(path: &Path) -> LicenseResult<Self> {
        Self::build(Some(path))
    }

    fn build(file: Option<&Path>) -> LicenseResult<Self> {
        let defaults = Self::default();

        let mut builder = Config::builder()
            // Start with defaults
            .set_default("keys.dir", defaults.keys.dir.to_string_lossy().into_owned())
            .map_err(config_error)?
            .set_default("keys.private_key_file", defaults.keys.private_key_file)
            .map_err(config_error)?
            .set_default("keys.public_key_file", defaults.keys.public_key_file)
            .map_err(config_error)?
            .set_default("keys.scheme", defaults.keys.scheme)
            .map_err(config_error)?
            .set_default("keys.bits", defaults.keys.bits as i64)
            .map_err(config_error)?
            .set_default("license.issuer_id", defaults.license.issuer_id)
            .map_err(config_error)?
            .set_default("license.version", defaults.license.version)
            .map_err(config_error)?
            .set_default("license.default_days", i64::from(defaults.license.default_days))
            .map_err(config_error)?
            .set_default("license.default_level", defaults.license.default_level)
            .map_err(config_error)?
            .set_default("logging.enabled", defaults.logging.enabled)
            .map_err(config_error)?
            .set_default("logging.level", defaults.logging.level)
            .map_err(config_error)?;

        builder = match file {
            Some(path) => {
                builder.add_source(config::File::from(path.to_path_buf()).required(true))
            }
            None => {
                builder.add_source(config::File::with_name(DEFAULT_CONFIG_NAME).required(false))
            }
        };

        // Override with environment variables
        let builder = builder
            .set_override_option("keys.dir", env::var("LICENSOR_KEY_DIR").ok())
            .map_err(config_error)?
            .set_override_option("keys.scheme", env::var("LICENSOR_KEY_SCHEME").ok())
            .map_err(config_error)?
            .set_override_option(
                "keys.bits",
                env::var("LICENSOR_KEY_BITS")
                    .ok()
                    .and_then(|v| v.parse::<i64>().ok()),
            )
            .map_err(config_error)?
            .set_override_option("license.issuer_id", env::var("LICENSOR_ISSUER_ID").ok())
            .map_err(config_error)?
            .set_override_option(
                "license.version",
                env::var("LICENSOR_LICENSE_VERSION").ok(),
            )
            .map_err(config_error)?
            .set_override_option(
                "license.default_days",
                env::var("LICENSOR_DEFAULT_DAYS")
                    .ok()
                    .and_then(|v| v.parse::<i64>().ok()),
            )
            .map_err(config_error)?
            .set_override_option(
                "license.default_level",
                env::var("LICENSOR_DEFAULT_LEVEL").ok(),
            )
            .map_err(config_error)?
            .set_override_option(
                "logging.enabled",
                env::var("LICENSOR_LOGGING_ENABLED")
                    .ok()
                    .and_then(|v| v.parse::<bool>().ok()),
            )
            .map_err(config_error)?
            .set_override_option("logging.level", env::var("LICENSOR_LOG_LEVEL").ok())
            .map_err(config_error)?;

        let settings = builder
            .build()
            .map_err(|e| LicenseError::ConfigError(format!("failed to build config: {e}")))?;

        let config: Self = settings
            .try_deserialize()
            .map_err(|e| LicenseError::ConfigError(format!("failed to deserialize config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> LicenseResult<()> {
        // Validate key config
        match self.keys.scheme.as_str() {
            "rsa" | "ed25519" => {}
            other => {
                return Err(LicenseError::ConfigError(format!(
                    "keys.scheme must be 'rsa' or 'ed25519', got '{other}'"
                )));
            }
        }
        if self.keys.scheme == "rsa" && self.keys.bits < MIN_RSA_BITS {
            return Err(LicenseError::ConfigError(format!(
                "keys.bits must be at least {MIN_RSA_BITS}, got {}",
                self.keys.bits
            )));
        }
        if self.keys.private_key_file.is_empty() || self.keys.public_key_file.is_empty() {
            return Err(LicenseError::ConfigError(
                "keys.private_key_file and keys.public_key_file cannot be empty".to_string(),
            ));
        }
        if self.keys.private_key_file == self.keys.public_key_file {
            return Err(LicenseError::ConfigError(
                "keys.private_key_file and keys.public_key_file must differ".to_string(),
            ));
        }

        // Validate license defaults
        if self.license.version.is_empty() {
            return Err(LicenseError::ConfigError(
                "license.version cannot be empty".to_string(),
            ));
        }
        self.license.default_level()?;

        // Validate log level
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(LicenseError::ConfigError(format!(
                    "logging.level must be one of: trace, debug, info, warn, error. Got '{other}'"
                )));
            }
        }

        validate_tiers(&self.tiers)
    }
}
