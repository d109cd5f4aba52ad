//! Offline Cache API
//!
//! Public entry points of the offline module.

pub use crate::offline::controller::{
    respond, CacheConfig, OfflineCacheController, DEFAULT_MANIFEST, OFFLINE_BODY,
};
pub use crate::offline::error::{CacheError, CacheResult};
pub use crate::offline::network::{
    FetchError, FetchRequest, FetchResponse, HttpNetwork, Method, Network,
};
pub use crate::offline::policy::{CachePolicy, Strategy};
pub use crate::offline::storage::{CacheGeneration, CacheStorage};
