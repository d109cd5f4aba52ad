//! Ledger wire types
//!
//! Requests are small JSON objects keyed by the session and the scanned
//! identifier; every endpoint answers with the same reply shape carrying a
//! status tag and whichever server counters apply to the operation.

use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{Display, EnumString};

/// Opaque session token issued by the ledger service when a list is created
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque id the ledger assigns to an accepted scan
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LedgerId(String);

impl LedgerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LedgerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of asset being scanned; selects the identifier field name on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Scooter,
    Battery,
}

impl AssetKind {
    /// JSON field carrying the identifier in ledger requests
    pub fn field_name(self) -> &'static str {
        match self {
            AssetKind::Scooter => "scooter_id",
            AssetKind::Battery => "battery_id",
        }
    }
}

/// Status tag returned by every ledger endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LedgerStatus {
    Success,
    Duplicate,
    Invalid,
    NotInList,
    Error,
}

/// Reply body shared by all ledger endpoints
///
/// Counters are server-authoritative. Only the fields relevant to the
/// operation are present: `total` and `ledger_id` for scans,
/// `total_validated` for validation and unvalidation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerReply {
    pub status: LedgerStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_validated: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger_id: Option<LedgerId>,
}

impl LedgerReply {
    pub fn status(status: LedgerStatus) -> Self {
        Self {
            status,
            total: None,
            total_validated: None,
            ledger_id: None,
        }
    }

    pub fn with_total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }

    pub fn with_total_validated(mut self, total_validated: u64) -> Self {
        self.total_validated = Some(total_validated);
        self
    }

    pub fn with_ledger_id(mut self, ledger_id: LedgerId) -> Self {
        self.ledger_id = Some(ledger_id);
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == LedgerStatus::Success
    }
}

/// Endpoint paths, relative to the ledger base URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LedgerPaths {
    pub record_scan: String,
    pub record_battery_scan: String,
    pub record_validation: String,
    pub delete_scan: String,
    pub unvalidate: String,
}

impl Default for LedgerPaths {
    fn default() -> Self {
        Self {
            record_scan: "/save_scan".to_string(),
            record_battery_scan: "/save_battery_scan".to_string(),
            record_validation: "/save_validation".to_string(),
            delete_scan: "/delete_scan".to_string(),
            unvalidate: "/unvalidate_scooter".to_string(),
        }
    }
}

impl LedgerPaths {
    /// Path used to record a scan of the given asset kind
    pub fn record_path(&self, asset: AssetKind) -> &str {
        match asset {
            AssetKind::Scooter => &self.record_scan,
            AssetKind::Battery => &self.record_battery_scan,
        }
    }

    /// All paths, used to seed the cache policy's dynamic routes
    pub fn all(&self) -> [&str; 5] {
        [
            &self.record_scan,
            &self.record_battery_scan,
            &self.record_validation,
            &self.delete_scan,
            &self.unvalidate,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_parses_not_in_list() {
        let reply: LedgerReply =
            serde_json::from_str(r#"{"status":"not_in_list","total_validated":3}"#).unwrap();

        assert_eq!(reply.status, LedgerStatus::NotInList);
        assert_eq!(reply.total_validated, Some(3));
        assert_eq!(reply.total, None);
    }

    #[test]
    fn test_reply_parses_scan_success() {
        let reply: LedgerReply =
            serde_json::from_str(r#"{"status":"success","total":2,"ledger_id":"s-17"}"#).unwrap();

        assert!(reply.is_success());
        assert_eq!(reply.ledger_id, Some(LedgerId::new("s-17")));
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let parsed = serde_json::from_str::<LedgerReply>(r#"{"status":"maybe"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_asset_field_names() {
        assert_eq!(AssetKind::Scooter.field_name(), "scooter_id");
        assert_eq!(AssetKind::Battery.field_name(), "battery_id");
        assert_eq!("battery".parse::<AssetKind>().unwrap(), AssetKind::Battery);
    }

    #[test]
    fn test_record_path_by_asset() {
        let paths = LedgerPaths::default();
        assert_eq!(paths.record_path(AssetKind::Scooter), "/save_scan");
        assert_eq!(paths.record_path(AssetKind::Battery), "/save_battery_scan");
    }
}
