//! Scan profiles
//!
//! The scooter, battery and validation flows run the same engine with
//! different settings. A profile bundles those settings.

use crate::core::validation::validate_id_pattern;
use crate::ledger::types::AssetKind;
use crate::session::error::{SessionError, SessionResult};
use crate::session::normalize::NormalizerConfig;
use strum_macros::{Display, EnumString};

/// URL prefixes printed on scooter QR codes
pub const SCOOTER_PREFIXES: [&str; 2] = ["https://tier.app/", "https://qr.tier-services.io/"];

/// Shape of a short scooter id
pub const SCOOTER_ID_PATTERN: &str = "[A-Za-z0-9]{5,9}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum SessionMode {
    /// Build a list by appending accepted scans
    Collect,
    /// Check scans off against an expected list
    Validate,
}

#[derive(Debug, Clone)]
pub struct ScanProfile {
    pub name: &'static str,
    pub mode: SessionMode,
    pub asset: AssetKind,
    pub normalizer: NormalizerConfig,
}

fn scooter_prefixes() -> Vec<String> {
    SCOOTER_PREFIXES.iter().map(|p| p.to_string()).collect()
}

impl ScanProfile {
    /// Scooter collection: codes must carry a known prefix
    ///
    /// Bare ids are refused unless `[scan] accept-bare-ids` turns them on.
    pub fn scooter() -> SessionResult<Self> {
        Ok(Self {
            name: "scooter",
            mode: SessionMode::Collect,
            asset: AssetKind::Scooter,
            normalizer: NormalizerConfig {
                require_prefix: true,
                recognized_prefixes: scooter_prefixes(),
                id_pattern: Some(
                    validate_id_pattern(SCOOTER_ID_PATTERN)
                        .map_err(|message| SessionError::Configuration { message })?,
                ),
                accept_bare_ids: false,
            },
        })
    }

    /// Battery collection: labels carry the bare id
    pub fn battery() -> Self {
        Self {
            name: "battery",
            mode: SessionMode::Collect,
            asset: AssetKind::Battery,
            normalizer: NormalizerConfig::default(),
        }
    }

    /// Validation of a scooter list: prefixes are stripped when present
    pub fn validate() -> Self {
        Self {
            name: "validate",
            mode: SessionMode::Validate,
            asset: AssetKind::Scooter,
            normalizer: NormalizerConfig {
                require_prefix: false,
                recognized_prefixes: scooter_prefixes(),
                id_pattern: None,
                accept_bare_ids: true,
            },
        }
    }

    pub fn with_normalizer(mut self, normalizer: NormalizerConfig) -> Self {
        self.normalizer = normalizer;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::normalize::Normalizer;
    use std::str::FromStr;

    #[test]
    fn test_presets() {
        let scooter = ScanProfile::scooter().unwrap();
        assert_eq!(scooter.mode, SessionMode::Collect);
        assert!(scooter.normalizer.require_prefix);
        assert!(!scooter.normalizer.accept_bare_ids);

        let battery = ScanProfile::battery();
        assert_eq!(battery.asset, AssetKind::Battery);
        assert!(!battery.normalizer.require_prefix);
        assert!(battery.normalizer.recognized_prefixes.is_empty());

        assert_eq!(ScanProfile::validate().mode, SessionMode::Validate);
    }

    #[test]
    fn test_validate_profile_strips_known_prefixes() {
        let normalizer = Normalizer::new(ScanProfile::validate().normalizer);
        assert_eq!(
            normalizer.normalize("https://qr.tier-services.io/XY987").canonical_id,
            "XY987"
        );
        assert_eq!(normalizer.normalize("XY987").canonical_id, "XY987");
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!(SessionMode::from_str("validate").unwrap(), SessionMode::Validate);
        assert_eq!(SessionMode::Collect.to_string(), "collect");
    }
}
