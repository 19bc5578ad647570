//! The license record and its local validity rules.
//!
//! The JSON form uses camelCase field names and RFC 3339 timestamps:
//!
//! ```json
//! {
//!   "id": "7c0e0c8e-...",
//!   "userName": "alice",
//!   "deviceId": "dev-1",
//!   "level": "professional",
//!   "issuedAt": "2026-01-01T08:00:00.5+08:00",
//!   "expiresAt": "2026-01-31T08:00:00.5+08:00",
//!   "features": null,
//!   "signature": "base64...",
//!   "issuerId": "",
//!   "version": "1.0"
//! }
//! ```
//!
//! Field declaration order is the serialization order, and therefore part of
//! the signed payload. Do not reorder fields. Timestamps keep the offset they
//! were written with, and `features` keeps the difference between `null` and
//! `[]`, so a loaded license encodes back to the bytes that were signed.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::encoding::timestamp;
use crate::errors::{InvalidReason, LicenseError, LicenseResult};

/// Version string stamped on newly issued licenses.
pub const DEFAULT_LICENSE_VERSION: &str = "1.0";

/// Authorization level granted by a license.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseLevel {
    Basic,
    Professional,
    Enterprise,
}

impl LicenseLevel {
    pub const ALL: [LicenseLevel; 3] = [
        LicenseLevel::Basic,
        LicenseLevel::Professional,
        LicenseLevel::Enterprise,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LicenseLevel::Basic => "basic",
            LicenseLevel::Professional => "professional",
            LicenseLevel::Enterprise => "enterprise",
        }
    }
}

impl fmt::Display for LicenseLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LicenseLevel {
    type Err = LicenseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LicenseLevel::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| {
                LicenseError::InvalidArgument(format!(
                    "unknown license level '{s}' (expected basic, professional or enterprise)"
                ))
            })
    }
}

/// A signed record authorizing a user on one device until `expires_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct License {
    /// Unique identifier assigned at issuance.
    pub id: String,
    pub user_name: String,
    /// Device the license is bound to.
    pub device_id: String,
    pub level: LicenseLevel,
    #[serde(with = "timestamp")]
    pub issued_at: DateTime<FixedOffset>,
    /// Only changed by renewal.
    #[serde(with = "timestamp")]
    pub expires_at: DateTime<FixedOffset>,
    /// Enabled features. Stored and signed, not interpreted. `None` is
    /// written as `null`, which is what a license with no feature list holds.
    #[serde(default)]
    pub features: Option<Vec<String>>,
    /// Base64 signature over the canonical payload; empty while unsigned.
    pub signature: String,
    pub issuer_id: String,
    pub version: String,
}

fn add_days(from: DateTime<FixedOffset>, days: u32) -> LicenseResult<DateTime<FixedOffset>> {
    from.checked_add_signed(Duration::days(i64::from(days)))
        .ok_or_else(|| LicenseError::InvalidArgument(format!("{days} days is out of range")))
}

impl License {
    /// Create an unsigned license valid for `valid_days` from now.
    pub fn new(
        user_name: impl Into<String>,
        device_id: impl Into<String>,
        level: LicenseLevel,
        valid_days: u32,
    ) -> LicenseResult<Self> {
        Self::new_at(user_name, device_id, level, valid_days, Utc::now())
    }

    /// Create an unsigned license issued at `now`. Timestamps are in UTC.
    pub fn new_at(
        user_name: impl Into<String>,
        device_id: impl Into<String>,
        level: LicenseLevel,
        valid_days: u32,
        now: DateTime<Utc>,
    ) -> LicenseResult<Self> {
        let issued_at = now.fixed_offset();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            user_name: user_name.into(),
            device_id: device_id.into(),
            level,
            issued_at,
            expires_at: add_days(issued_at, valid_days)?,
            features: None,
            signature: String::new(),
            issuer_id: String::new(),
            version: DEFAULT_LICENSE_VERSION.to_string(),
        })
    }

    pub fn with_features(mut self, features: Vec<String>) -> Self {
        self.features = Some(features);
        self
    }

    pub fn with_issuer(mut self, issuer_id: impl Into<String>) -> Self {
        self.issuer_id = issuer_id.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// True once a signature has been attached. Says nothing about its validity.
    pub fn is_signed(&self) -> bool {
        !self.signature.is_empty()
    }

    /// Feature list, empty when none was recorded.
    pub fn features(&self) -> &[String] {
        self.features.as_deref().unwrap_or(&[])
    }

    pub fn has_feature(&self, feature: &str) -> bool {
        self.features().iter().any(|f| f == feature)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Expired strictly after `expires_at`; the exact instant still counts as valid.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at.with_timezone(&Utc)
    }

    /// Not expired and bound to `device_id`.
    pub fn is_valid(&self, device_id: &str) -> bool {
        self.is_valid_at(device_id, Utc::now())
    }

    pub fn is_valid_at(&self, device_id: &str, now: DateTime<Utc>) -> bool {
        self.check_validity_at(device_id, now).is_ok()
    }

    /// Like [`License::is_valid_at`], but reports which rule failed. Expiry is checked first.
    pub fn check_validity_at(
        &self,
        device_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), InvalidReason> {
        if self.is_expired_at(now) {
            return Err(InvalidReason::Expired);
        }
        if self.device_id != device_id {
            return Err(InvalidReason::DeviceMismatch);
        }
        Ok(())
    }

    pub fn days_until_expiration(&self) -> i64 {
        self.days_until_expiration_at(Utc::now())
    }

    /// Whole days left, rounded down. 0 once expired.
    pub fn days_until_expiration_at(&self, now: DateTime<Utc>) -> i64 {
        if self.is_expired_at(now) {
            return 0;
        }
        (self.expires_at.with_timezone(&Utc) - now).num_days()
    }

    /// Extend the expiry by `days`.
    ///
    /// A live license is extended from its current expiry, keeping its offset.
    /// An expired one restarts from now (in UTC), so lapsed time cannot be
    /// reclaimed.
    pub fn renew(&mut self, days: u32) -> LicenseResult<()> {
        self.renew_at(days, Utc::now())
    }

    pub fn renew_at(&mut self, days: u32, now: DateTime<Utc>) -> LicenseResult<()> {
        let base = if self.is_expired_at(now) {
            now.fixed_offset()
        } else {
            self.expires_at
        };
        self.expires_at = add_days(base, days)?;
        Ok(())
    }
}
