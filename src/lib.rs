pub mod app;
pub mod core;
pub mod decoder;
pub mod ledger;
pub mod offline;
pub mod session;

pub use core::version::ledger_protocol_version;
