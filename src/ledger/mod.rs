//! Ledger Client
//!
//! Thin request/response access to the Scan Ledger Service, the authoritative
//! store of accepted scans and validations. Four operations are exposed
//! through [`LedgerClient`]: `record_scan`, `record_validation`, `delete_scan`
//! and `unvalidate_scooter`. Clients never retry; the session engine decides
//! what a failure means for local state.

pub mod api;
pub mod client;
pub mod error;
pub mod http;
pub mod memory;
pub mod types;

pub use client::LedgerClient;
pub use error::{LedgerError, LedgerResult};
pub use http::HttpLedgerClient;
pub use memory::MemoryLedger;
pub use types::{AssetKind, LedgerId, LedgerPaths, LedgerReply, LedgerStatus, SessionId};
