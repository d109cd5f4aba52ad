//! Fake network for cache tests

use crate::offline::api::{FetchError, FetchRequest, FetchResponse, Network};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Serves fixed bodies per URL; can be switched offline
#[derive(Default)]
pub(super) struct FakeNetwork {
    routes: Mutex<HashMap<String, FetchResponse>>,
    offline: AtomicBool,
    hits: Mutex<Vec<String>>,
}

impl FakeNetwork {
    pub(super) fn serving(routes: &[(&str, &str)]) -> Self {
        let network = Self::default();
        for (url, body) in routes {
            network.route(url, FetchResponse::new(200, *body));
        }
        network
    }

    pub(super) fn route(&self, url: &str, response: FetchResponse) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), response);
    }

    pub(super) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub(super) fn hits(&self) -> Vec<String> {
        self.hits.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Network for FakeNetwork {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        self.hits.lock().unwrap().push(request.url.clone());
        if self.offline.load(Ordering::SeqCst) {
            return Err(FetchError::Unreachable {
                url: request.url.clone(),
                message: "offline".to_string(),
            });
        }
        Ok(self
            .routes
            .lock()
            .unwrap()
            .get(&request.url)
            .cloned()
            .unwrap_or_else(|| FetchResponse::new(404, "not found")))
    }
}
