//! Structured logging for license lifecycle events.
//!
//! Every state change goes through [`log_license_event`], which opens a
//! `license_event` span carrying the event name and license ID. Signatures and
//! key material are never logged.
//!
//! # Usage
//!
//! ```rust,ignore
//! use licensor::logging::{init_logging, log_license_event, LicenseEvent};
//!
//! init_logging(&config.logging)?;
//! log_license_event(LicenseEvent::Issued, &license.id, Some("level=basic"));
//! ```

use std::path::Path;
use std::str::FromStr;

use tracing::{info, info_span, warn, Level};

use crate::config::LoggingConfig;
use crate::errors::{LicenseError, LicenseResult};

/// License lifecycle event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseEvent {
    /// A key pair was generated and saved
    KeysGenerated,
    /// A license was created and signed
    Issued,
    /// A license was written to disk
    Saved,
    /// A license was read from disk
    Loaded,
    /// A license passed verification
    Verified,
    /// A license failed verification
    VerificationFailed,
    /// A license expiry was extended and re-signed
    Renewed,
}

impl std::fmt::Display for LicenseEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LicenseEvent::KeysGenerated => "keys_generated",
            LicenseEvent::Issued => "issued",
            LicenseEvent::Saved => "saved",
            LicenseEvent::Loaded => "loaded",
            LicenseEvent::Verified => "verified",
            LicenseEvent::VerificationFailed => "verification_failed",
            LicenseEvent::Renewed => "renewed",
        };
        write!(f, "{}", s)
    }
}

/// Log a license state change event.
///
/// # Arguments
///
/// * `event` - The type of license event
/// * `license_id` - The license ID
/// * `details` - Optional additional details about the event
pub fn log_license_event(event: LicenseEvent, license_id: &str, details: Option<&str>) {
    let span = info_span!(
        "license_event",
        event = %event,
        license_id = %license_id,
    );
    let _enter = span.enter();

    match event {
        LicenseEvent::VerificationFailed => {
            if let Some(d) = details {
                warn!(reason = %d, "License event occurred");
            } else {
                warn!("License event occurred");
            }
        }
        _ => {
            if let Some(d) = details {
                info!(details = %d, "License event occurred");
            } else {
                info!("License event occurred");
            }
        }
    }
}

/// Log an event concerning key files rather than a particular license.
pub fn log_key_event(event: LicenseEvent, private_key: &Path, public_key: &Path) {
    let span = info_span!("key_event", event = %event);
    let _enter = span.enter();

    info!(
        private_key = %private_key.display(),
        public_key = %public_key.display(),
        "Key event occurred"
    );
}

/// Install a stderr `fmt` subscriber at the configured level.
///
/// Does nothing when logging is disabled. Calling it again after a subscriber
/// is installed is harmless.
pub fn init_logging(config: &LoggingConfig) -> LicenseResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let level = Level::from_str(&config.level).map_err(|_| {
        LicenseError::ConfigError(format!("invalid log level '{}'", config.level))
    })?;

    // An already installed global subscriber is fine.
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_names_are_snake_case() {
        assert_eq!(LicenseEvent::Issued.to_string(), "issued");
        assert_eq!(
            LicenseEvent::VerificationFailed.to_string(),
            "verification_failed"
        );
        assert_eq!(LicenseEvent::KeysGenerated.to_string(), "keys_generated");
    }

    #[test]
    fn init_logging_disabled_is_noop() {
        let config = LoggingConfig::default();
        assert!(init_logging(&config).is_ok());
    }

    #[test]
    fn init_logging_rejects_bad_level() {
        let config = LoggingConfig {
            enabled: true,
            level: "chatty".to_string(),
        };
        assert!(matches!(
            init_logging(&config),
            Err(LicenseError::ConfigError(_))
        ));
    }

    #[test]
    fn init_logging_twice_is_ok() {
        let config = LoggingConfig {
            enabled: true,
            level: "debug".to_string(),
        };
        assert!(init_logging(&config).is_ok());
        assert!(init_logging(&config).is_ok());
    }
}
