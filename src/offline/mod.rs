//! Offline Cache Controller
//!
//! Transparent fetch interception with a two-strategy policy over named cache
//! generations. Dynamic routes go network-first with a cache fallback, static
//! assets cache-first. Callers always receive a response: when neither source
//! can answer, a `504 Gateway Timeout` is synthesized.
//!
//! The [`Network`] seam defined here is also what the ledger client talks
//! through, so the controller can sit between the two.

pub mod api;
pub mod controller;
pub mod error;
pub mod network;
pub mod policy;
pub mod storage;

pub use controller::{respond, CacheConfig, OfflineCacheController, OFFLINE_BODY};
pub use error::{CacheError, CacheResult};
pub use network::{FetchError, FetchRequest, FetchResponse, HttpNetwork, Method, Network};
pub use policy::{CachePolicy, Strategy};
pub use storage::{CacheGeneration, CacheStorage};

#[cfg(test)]
mod tests;
