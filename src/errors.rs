//! Error types for license issuing and verification.
//!
//! Policy failures (expired, wrong device) and cryptographic failures (bad
//! signature) are separate variants so callers can report the precise reason.
//! Both are terminal for verification.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Why a license failed the local validity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    /// Current time is past `expires_at`.
    Expired,
    /// Presented device ID differs from the bound one.
    DeviceMismatch,
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InvalidReason::Expired => "expired",
            InvalidReason::DeviceMismatch => "device-mismatch",
        };
        write!(f, "{}", s)
    }
}

/// Errors produced by the licensing core.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// Key pair generation failed (entropy source, unsupported size).
    #[error("key generation failed: {0}")]
    KeyGenerationError(String),

    /// Reading or writing a file failed.
    #[error("I/O error on {}: {source}", .path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Armor or DER encoding of key material is malformed.
    #[error("malformed key material: {0}")]
    KeyFormatError(String),

    /// Key material decoded but is not the expected key type.
    #[error("unexpected key type: {0}")]
    KeyTypeError(String),

    /// A configured key could not be loaded.
    #[error("failed to load key from {}: {source}", .path.display())]
    KeyLoadError {
        path: PathBuf,
        #[source]
        source: Box<LicenseError>,
    },

    /// License JSON is malformed or missing required fields.
    #[error("invalid license data: {0}")]
    DeserializationError(String),

    /// License could not be encoded.
    #[error("failed to serialize license: {0}")]
    SerializationError(String),

    /// The signing primitive rejected the key or payload.
    #[error("signing failed: {0}")]
    SigningError(String),

    /// Signature does not match the payload under the given public key.
    #[error("license signature is invalid")]
    SignatureInvalid,

    /// License failed the local validity check.
    #[error("license is not valid: {0}")]
    LicenseInvalid(InvalidReason),

    /// Configuration could not be loaded or failed validation.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Caller supplied an unusable argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl LicenseError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LicenseError::IoError {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn key_load(path: impl Into<PathBuf>, source: LicenseError) -> Self {
        LicenseError::KeyLoadError {
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// Returns true for non-cryptographic rejections (expired, device mismatch).
    pub fn is_policy_failure(&self) -> bool {
        matches!(self, LicenseError::LicenseInvalid(_))
    }

    /// Returns true if the signature check itself failed.
    pub fn is_crypto_failure(&self) -> bool {
        matches!(self, LicenseError::SignatureInvalid)
    }

    /// The policy reason, if this is a policy failure.
    pub fn invalid_reason(&self) -> Option<InvalidReason> {
        match self {
            LicenseError::LicenseInvalid(reason) => Some(*reason),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for LicenseError {
    fn from(e: serde_json::Error) -> Self {
        LicenseError::SerializationError(e.to_string())
    }
}

/// Result type for licensing operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
