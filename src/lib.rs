//! Licensor - signed, device-bound software licenses
//!
//! Licenses are JSON records signed with an asymmetric key. Any change to a
//! signed field (user, device, level, expiry, features, issuer, version)
//! invalidates the signature. The issuer can renew a license, which extends
//! its expiry and re-signs it.
//!
//! # Features
//!
//! - `ed25519` - Ed25519 signature scheme in addition to RSA. Enabled by default.
//!
//! # Example
//!
//! ```rust,ignore
//! use licensor::{LicenseLevel, LicenseManager, ManagerConfig};
//!
//! let manager = LicenseManager::new(ManagerConfig::new("/etc/licensor"));
//! manager.generate_keys()?;
//!
//! let license = manager.generate_license("alice", "dev-1", LicenseLevel::Professional, 30)?;
//! manager.save_license(&license, "license.json".as_ref())?;
//!
//! let loaded = manager.load_license("license.json".as_ref())?;
//! manager.verify_license(&loaded, "dev-1")?;
//! ```

pub mod config;
pub mod encoding;
pub mod errors;
pub mod keys;
pub mod license;
pub mod logging;
pub mod manager;
pub mod scheme;
pub mod signing;
pub mod storage;
pub mod tiers;

pub use config::LicensorConfig;
pub use errors::{InvalidReason, LicenseError, LicenseResult};
pub use keys::KeyStore;
pub use license::{License, LicenseLevel};
pub use manager::{LicenseManager, LicenseState, ManagerConfig};
pub use scheme::{KeyPair, RsaPkcs1Sha256, SignatureScheme};
pub use signing::canonical_payload;

#[cfg(feature = "ed25519")]
pub use scheme::Ed25519Scheme;
