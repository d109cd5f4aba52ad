//! Ledger API
//!
//! Public entry points of the ledger module. External modules should import
//! from here rather than from the internal files.

pub use crate::ledger::client::LedgerClient;
pub use crate::ledger::http::HttpLedgerClient;
pub use crate::ledger::memory::MemoryLedger;

pub use crate::ledger::error::{LedgerError, LedgerResult};

pub use crate::ledger::types::{
    AssetKind, LedgerId, LedgerPaths, LedgerReply, LedgerStatus, SessionId,
};
