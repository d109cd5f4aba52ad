//! Test modules for the scan session
//!
//! Suites are split by flow; `support` builds sessions over an in-memory
//! ledger and a manual clock.

mod pipeline;
mod support;
mod validate;
