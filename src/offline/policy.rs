//! Fetch strategy selection

use crate::offline::network::FetchRequest;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// How a single request is served
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Strategy {
    /// Network, then cache, then a synthesized 504
    NetworkFirst,
    /// Cache, then network
    CacheFirst,
}

/// Per-request strategy predicate plus cache write-back switches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CachePolicy {
    /// Path prefixes served network-first; everything else is cache-first
    pub dynamic_routes: Vec<String>,
    /// Store successful GET responses of dynamic routes for offline fallback
    pub refresh_dynamic: bool,
    /// Store successful GET responses fetched after a static cache miss
    pub populate_static: bool,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            dynamic_routes: ["/lists", "/list/", "/scan", "/save_scan", "/export"]
                .iter()
                .map(|r| r.to_string())
                .collect(),
            refresh_dynamic: false,
            populate_static: false,
        }
    }
}

impl CachePolicy {
    /// Add a dynamic route prefix unless already covered
    pub fn with_dynamic_route(mut self, route: &str) -> Self {
        if !self.is_dynamic_path(route) {
            self.dynamic_routes.push(route.to_string());
        }
        self
    }

    pub fn is_dynamic_path(&self, path: &str) -> bool {
        self.dynamic_routes
            .iter()
            .any(|route| path.starts_with(route.as_str()))
    }

    /// Decide the strategy for a request; decided once per request
    pub fn strategy_for(&self, request: &FetchRequest) -> Strategy {
        if self.is_dynamic_path(&request.path()) {
            Strategy::NetworkFirst
        } else {
            Strategy::CacheFirst
        }
    }
}
