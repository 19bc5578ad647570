//! License lifecycle: issue, persist, load, verify and renew.
//!
//! ```text
//! Unsigned --sign--> Signed --verify--> Valid | Expired | DeviceMismatch | SignatureInvalid
//!                      ^                                  |
//!                      +----------- renew + re-sign ------+
//! ```
//!
//! Keys are read from disk on every operation that needs them. The manager
//! holds no key material between calls.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::config::LicensorConfig;
use crate::encoding::{format_timestamp, to_pretty_string};
use crate::errors::{LicenseError, LicenseResult};
use crate::keys::KeyStore;
use crate::license::{License, LicenseLevel, DEFAULT_LICENSE_VERSION};
use crate::logging::{log_key_event, log_license_event, LicenseEvent};
use crate::scheme::{RsaPkcs1Sha256, SignatureScheme, DEFAULT_KEY_BITS};
use crate::signing::{sign_license, verify_license_signature};
use crate::storage::{read_to_string, write_atomic};
use crate::tiers::{tier_features, TierConfig};

/// Everything the manager needs, passed in explicitly.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    pub private_key_path: PathBuf,
    pub public_key_path: PathBuf,
    /// Modulus size used by [`LicenseManager::generate_keys`].
    pub key_bits: usize,
    /// Written into `issuer_id` of new licenses.
    pub issuer_id: String,
    /// Written into `version` of new licenses.
    pub version: String,
    pub tiers: HashMap<String, TierConfig>,
}

impl ManagerConfig {
    /// Defaults with `private.pem` / `public.pem` inside `key_dir`.
    pub fn new(key_dir: impl AsRef<Path>) -> Self {
        let key_dir = key_dir.as_ref();
        Self {
            private_key_path: key_dir.join("private.pem"),
            public_key_path: key_dir.join("public.pem"),
            key_bits: DEFAULT_KEY_BITS,
            issuer_id: String::new(),
            version: DEFAULT_LICENSE_VERSION.to_string(),
            tiers: HashMap::new(),
        }
    }
}

impl From<&LicensorConfig> for ManagerConfig {
    fn from(config: &LicensorConfig) -> Self {
        Self {
            private_key_path: config.keys.private_key_path(),
            public_key_path: config.keys.public_key_path(),
            key_bits: config.keys.bits,
            issuer_id: config.license.issuer_id.clone(),
            version: config.license.version.clone(),
            tiers: config.tiers.clone(),
        }
    }
}

/// Where a license stands, as far as this manager can tell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseState {
    /// No signature attached.
    Unsigned,
    /// Signature attached but not yet checked.
    Signed,
    Valid,
    Expired,
    DeviceMismatch,
    SignatureInvalid,
}

impl LicenseState {
    /// State before any verification: `Signed` or `Unsigned`.
    pub fn of(license: &License) -> Self {
        if license.is_signed() {
            LicenseState::Signed
        } else {
            LicenseState::Unsigned
        }
    }
}

impl fmt::Display for LicenseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LicenseState::Unsigned => "unsigned",
            LicenseState::Signed => "signed",
            LicenseState::Valid => "valid",
            LicenseState::Expired => "expired",
            LicenseState::DeviceMismatch => "device-mismatch",
            LicenseState::SignatureInvalid => "signature-invalid",
        };
        write!(f, "{}", s)
    }
}

/// Issues, verifies and renews licenses with one signature scheme.
pub struct LicenseManager<S: SignatureScheme = RsaPkcs1Sha256> {
    config: ManagerConfig,
    keys: KeyStore<S>,
}

impl LicenseManager<RsaPkcs1Sha256> {
    /// Manager using RSA PKCS#1 v1.5 with SHA-256.
    pub fn new(config: ManagerConfig) -> Self {
        Self::with_scheme(config, RsaPkcs1Sha256)
    }
}

impl<S: SignatureScheme> LicenseManager<S> {
    pub fn with_scheme(config: ManagerConfig, scheme: S) -> Self {
        Self {
            config,
            keys: KeyStore::new(scheme),
        }
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn key_store(&self) -> &KeyStore<S> {
        &self.keys
    }

    /// Generate a key pair and write it to the configured paths.
    pub fn generate_keys(&self) -> LicenseResult<()> {
        let pair = self.keys.generate_key_pair(self.config.key_bits)?;
        self.keys.save_key_pair(
            &pair,
            &self.config.private_key_path,
            &self.config.public_key_path,
        )?;

        log_key_event(
            LicenseEvent::KeysGenerated,
            &self.config.private_key_path,
            &self.config.public_key_path,
        );
        Ok(())
    }

    fn load_private_key(&self) -> LicenseResult<S::PrivateKey> {
        let path = &self.config.private_key_path;
        self.keys
            .load_private_key(path)
            .map_err(|e| LicenseError::key_load(path, e))
    }

    fn load_public_key(&self) -> LicenseResult<S::PublicKey> {
        let path = &self.config.public_key_path;
        self.keys
            .load_public_key(path)
            .map_err(|e| LicenseError::key_load(path, e))
    }

    /// Create and sign a license valid for `valid_days` from now.
    ///
    /// The license starts with the configured tier features for `level`, or
    /// no feature list (`null`) when the level has no tier.
    pub fn generate_license(
        &self,
        user_name: &str,
        device_id: &str,
        level: LicenseLevel,
        valid_days: u32,
    ) -> LicenseResult<License> {
        if user_name.trim().is_empty() {
            return Err(LicenseError::InvalidArgument(
                "user name cannot be empty".to_string(),
            ));
        }
        if device_id.trim().is_empty() {
            return Err(LicenseError::InvalidArgument(
                "device ID cannot be empty".to_string(),
            ));
        }

        let mut license = License::new(user_name, device_id, level, valid_days)?
            .with_issuer(self.config.issuer_id.clone())
            .with_version(self.config.version.clone());
        license.features = tier_features(&self.config.tiers, level);

        let key = self.load_private_key()?;
        license.signature = sign_license(self.keys.scheme(), &key, &license)?;

        log_license_event(
            LicenseEvent::Issued,
            &license.id,
            Some(&format!("level={} days={}", level, valid_days)),
        );
        Ok(license)
    }

    /// Write the license, signature included, as pretty-printed JSON.
    pub fn save_license(&self, license: &License, path: &Path) -> LicenseResult<()> {
        let json = to_pretty_string(license)?;
        write_atomic(path, json.as_bytes())?;

        log_license_event(
            LicenseEvent::Saved,
            &license.id,
            Some(&path.display().to_string()),
        );
        Ok(())
    }

    pub fn load_license(&self, path: &Path) -> LicenseResult<License> {
        let json = read_to_string(path)?;
        let license: License = serde_json::from_str(&json)
            .map_err(|e| LicenseError::DeserializationError(format!("{}: {e}", path.display())))?;

        log_license_event(LicenseEvent::Loaded, &license.id, None);
        Ok(license)
    }

    /// Verify expiry, device binding and signature.
    ///
    /// Policy checks run first and fail without touching the public key.
    pub fn verify_license(&self, license: &License, device_id: &str) -> LicenseResult<()> {
        self.verify_license_at(license, device_id, Utc::now())
    }

    pub fn verify_license_at(
        &self,
        license: &License,
        device_id: &str,
        now: DateTime<Utc>,
    ) -> LicenseResult<()> {
        if let Err(reason) = license.check_validity_at(device_id, now) {
            log_license_event(
                LicenseEvent::VerificationFailed,
                &license.id,
                Some(&reason.to_string()),
            );
            return Err(LicenseError::LicenseInvalid(reason));
        }

        let key = self.load_public_key()?;
        if let Err(e) = verify_license_signature(self.keys.scheme(), &key, license) {
            log_license_event(
                LicenseEvent::VerificationFailed,
                &license.id,
                Some("signature-invalid"),
            );
            return Err(e);
        }

        log_license_event(LicenseEvent::Verified, &license.id, None);
        Ok(())
    }

    /// Extend the expiry by `days` and re-sign.
    ///
    /// Only `expires_at` and `signature` change. On error the license is left
    /// exactly as it was.
    pub fn renew_license(&self, license: &mut License, days: u32) -> LicenseResult<()> {
        self.renew_license_at(license, days, Utc::now())
    }

    pub fn renew_license_at(
        &self,
        license: &mut License,
        days: u32,
        now: DateTime<Utc>,
    ) -> LicenseResult<()> {
        let key = self.load_private_key()?;

        let mut renewed = license.clone();
        renewed.renew_at(days, now)?;
        renewed.signature = sign_license(self.keys.scheme(), &key, &renewed)?;
        *license = renewed;

        log_license_event(
            LicenseEvent::Renewed,
            &license.id,
            Some(&format!(
                "days={} expires_at={}",
                days,
                format_timestamp(&license.expires_at)
            )),
        );
        Ok(())
    }

    /// Classify a license. Operational failures such as an unreadable public
    /// key are still returned as errors.
    pub fn check(&self, license: &License, device_id: &str) -> LicenseResult<LicenseState> {
        self.check_at(license, device_id, Utc::now())
    }

    pub fn check_at(
        &self,
        license: &License,
        device_id: &str,
        now: DateTime<Utc>,
    ) -> LicenseResult<LicenseState> {
        use crate::errors::InvalidReason;

        if !license.is_signed() {
            return Ok(LicenseState::Unsigned);
        }

        match self.verify_license_at(license, device_id, now) {
            Ok(()) => Ok(LicenseState::Valid),
            Err(LicenseError::LicenseInvalid(InvalidReason::Expired)) => Ok(LicenseState::Expired),
            Err(LicenseError::LicenseInvalid(InvalidReason::DeviceMismatch)) => {
                Ok(LicenseState::DeviceMismatch)
            }
            Err(LicenseError::SignatureInvalid) => Ok(LicenseState::SignatureInvalid),
            Err(e) => Err(e),
        }
    }
}
