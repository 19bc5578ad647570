//! Per-level feature sets.
//!
//! Tiers are optional. When a level has a tier configured, licenses issued at
//! that level start out with the tier's feature list:
//!
//! ```toml
//! [tiers.basic]
//! features = []
//!
//! [tiers.professional]
//! features = ["export", "sync"]
//!
//! [tiers.enterprise]
//! features = ["export", "sync", "sso"]
//! ```
//!
//! Tier names must be license level names.

use serde::Deserialize;
use std::collections::HashMap;

use crate::errors::{LicenseError, LicenseResult};
use crate::license::LicenseLevel;

/// Configuration for a single tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TierConfig {
    /// Features granted at this tier
    pub features: Vec<String>,
}

/// Feature list configured for `level`, or `None` when the level has no tier.
pub fn tier_features(
    tiers: &HashMap<String, TierConfig>,
    level: LicenseLevel,
) -> Option<Vec<String>> {
    tiers.get(level.as_str()).map(|tier| tier.features.clone())
}

/// Reject tier names that are not license levels.
pub fn validate_tiers(tiers: &HashMap<String, TierConfig>) -> LicenseResult<()> {
    for name in tiers.keys() {
        if name.parse::<LicenseLevel>().is_err() {
            return Err(LicenseError::ConfigError(format!(
                "tiers.{name} does not name a license level (basic, professional, enterprise)"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tiers() -> HashMap<String, TierConfig> {
        let mut tiers = HashMap::new();
        tiers.insert(
            "professional".to_string(),
            TierConfig {
                features: vec!["export".to_string(), "sync".to_string()],
            },
        );
        tiers
    }

    #[test]
    fn features_for_configured_level() {
        let tiers = sample_tiers();
        assert_eq!(
            tier_features(&tiers, LicenseLevel::Professional),
            Some(vec!["export".to_string(), "sync".to_string()])
        );
    }

    #[test]
    fn missing_tier_yields_none() {
        let tiers = sample_tiers();
        assert_eq!(tier_features(&tiers, LicenseLevel::Enterprise), None);
    }

    #[test]
    fn empty_tier_yields_empty_list() {
        let mut tiers = sample_tiers();
        tiers.insert("basic".to_string(), TierConfig::default());
        assert_eq!(tier_features(&tiers, LicenseLevel::Basic), Some(vec![]));
    }

    #[test]
    fn validate_rejects_unknown_tier_names() {
        let mut tiers = sample_tiers();
        assert!(validate_tiers(&tiers).is_ok());

        tiers.insert("gold".to_string(), TierConfig::default());
        assert!(matches!(
            validate_tiers(&tiers),
            Err(LicenseError::ConfigError(_))
        ));
    }
}
