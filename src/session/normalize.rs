//! Identifier Normalizer
//!
//! Turns a raw decoded string into a canonical short identifier. Scooter QR
//! codes carry the id behind a vendor URL; battery labels carry the bare id.
//! Which policy applies is explicit configuration, never inferred.

use regex::Regex;

/// Prefix policy for one scan flow
#[derive(Debug, Clone, Default)]
pub struct NormalizerConfig {
    /// Reject strings matching no recognized prefix
    pub require_prefix: bool,
    /// Tried in order; the first match is stripped
    pub recognized_prefixes: Vec<String>,
    /// Full-match pattern the canonical id must satisfy, if set
    pub id_pattern: Option<Regex>,
    /// With `require_prefix`, still accept an unprefixed id that matches `id_pattern`
    pub accept_bare_ids: bool,
}

/// Result of normalizing one raw string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedId {
    pub raw: String,
    pub canonical_id: String,
    pub valid: bool,
}

impl NormalizedId {
    fn new(raw: &str, canonical_id: &str, valid: bool) -> Self {
        Self {
            raw: raw.to_string(),
            canonical_id: canonical_id.to_string(),
            valid,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    fn matches_pattern(&self, candidate: &str) -> bool {
        match &self.config.id_pattern {
            Some(pattern) => pattern.is_match(candidate),
            None => true,
        }
    }

    pub fn normalize(&self, raw: &str) -> NormalizedId {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return NormalizedId::new(raw, "", false);
        }

        let stripped = self
            .config
            .recognized_prefixes
            .iter()
            .find_map(|prefix| trimmed.strip_prefix(prefix.as_str()));

        match stripped {
            Some(rest) => {
                let canonical = rest.trim();
                let valid = !canonical.is_empty() && self.matches_pattern(canonical);
                NormalizedId::new(raw, canonical, valid)
            }
            None if !self.config.require_prefix => {
                NormalizedId::new(raw, trimmed, self.matches_pattern(trimmed))
            }
            None => {
                let valid = self.config.accept_bare_ids
                    && self.config.id_pattern.is_some()
                    && self.matches_pattern(trimmed);
                NormalizedId::new(raw, trimmed, valid)
            }
        }
    }
}
