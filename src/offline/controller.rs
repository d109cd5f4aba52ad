//! Offline Cache Controller
//!
//! Owns the cache generations and intercepts every outgoing request. The
//! interception itself is the free function [`respond`], which the controller
//! calls with its active generation; keeping it free of controller state makes
//! the strategy testable against any storage and network.

use crate::core::sync::{handle_rwlock_read, handle_rwlock_write};
use crate::offline::error::{CacheError, CacheResult};
use crate::offline::network::{FetchError, FetchRequest, FetchResponse, Network};
use crate::offline::policy::{CachePolicy, Strategy};
use crate::offline::storage::{CacheGeneration, CacheStorage};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

/// Body of the synthesized response when neither network nor cache can answer
pub const OFFLINE_BODY: &str = "Network error occurred and no cached data available.";

/// Static assets seeded on install
pub const DEFAULT_MANIFEST: &[&str] = &[
    "/",
    "/static/css/style.css",
    "/static/js/main.js",
    "/static/js/qr-scanner.umd.min.js",
    "/static/audio/beep.mp3",
    "/static/manifest.json",
    "/static/icons/logo2_192x192.png",
    "/static/icons/logo2_512x512.png",
];

/// Cache generation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CacheConfig {
    /// Version tag naming the generation this build installs
    pub version: String,
    /// Asset URLs, absolute or relative to the base URL
    pub manifest: Vec<String>,
    #[serde(flatten)]
    pub policy: CachePolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            version: "fieldscan-v1".to_string(),
            manifest: DEFAULT_MANIFEST.iter().map(|s| s.to_string()).collect(),
            policy: CachePolicy::default(),
        }
    }
}

/// Serve one request according to its strategy
///
/// Reads match across every generation in `storage`; optional write-back goes
/// to `write_target`. Never fails: an unanswerable request becomes a 504.
pub async fn respond(
    request: &FetchRequest,
    storage: &CacheStorage,
    write_target: Option<&CacheGeneration>,
    policy: &CachePolicy,
    network: &dyn Network,
) -> FetchResponse {
    let strategy = policy.strategy_for(request);
    log::trace!("{} {} via {}", request.method, request.url, strategy);

    match strategy {
        Strategy::NetworkFirst => match network.fetch(request).await {
            Ok(response) => {
                if policy.refresh_dynamic {
                    store(request, &response, write_target);
                }
                response
            }
            Err(e) => {
                log::debug!("Network failed for {}: {}", request.url, e);
                match cached(request, storage) {
                    Some(hit) => {
                        log::debug!("Serving {} from cache", request.url);
                        hit
                    }
                    None => offline_response(request),
                }
            }
        },
        Strategy::CacheFirst => {
            if let Some(hit) = cached(request, storage) {
                log::trace!("Cache hit for {}", request.url);
                return hit;
            }
            match network.fetch(request).await {
                Ok(response) => {
                    if policy.populate_static {
                        store(request, &response, write_target);
                    }
                    response
                }
                Err(e) => {
                    log::debug!("Network failed for {}: {}", request.url, e);
                    offline_response(request)
                }
            }
        }
    }
}

fn cached(request: &FetchRequest, storage: &CacheStorage) -> Option<FetchResponse> {
    if !request.is_cacheable() {
        return None;
    }
    match storage.lookup_any(&request.url) {
        Ok(hit) => hit,
        Err(e) => {
            log::warn!("Cache lookup for {} failed: {}", request.url, e);
            None
        }
    }
}

fn store(request: &FetchRequest, response: &FetchResponse, target: Option<&CacheGeneration>) {
    let Some(generation) = target else {
        return;
    };
    if !request.is_cacheable() || !response.is_success() {
        return;
    }
    if let Err(e) = generation.put(&request.url, response.clone()) {
        log::warn!("Could not store {} in {}: {}", request.url, generation.name(), e);
    }
}

fn offline_response(request: &FetchRequest) -> FetchResponse {
    log::debug!("No cached response available for {}", request.url);
    FetchResponse::gateway_timeout(OFFLINE_BODY)
}

/// Controller driving install, activate and fetch interception
pub struct OfflineCacheController {
    config: CacheConfig,
    base_url: Option<reqwest::Url>,
    storage: Arc<CacheStorage>,
    network: Arc<dyn Network>,
    active: RwLock<Option<Arc<CacheGeneration>>>,
}

impl OfflineCacheController {
    pub fn new(
        config: CacheConfig,
        base_url: Option<&str>,
        storage: Arc<CacheStorage>,
        network: Arc<dyn Network>,
    ) -> CacheResult<Self> {
        let base_url = base_url
            .map(|raw| {
                reqwest::Url::parse(raw).map_err(|e| CacheError::InvalidManifest {
                    entry: raw.to_string(),
                    message: format!("Invalid base URL: {}", e),
                })
            })
            .transpose()?;

        Ok(Self {
            config,
            base_url,
            storage,
            network,
            active: RwLock::new(None),
        })
    }

    pub fn version(&self) -> &str {
        &self.config.version
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.config.policy
    }

    pub fn storage(&self) -> &Arc<CacheStorage> {
        &self.storage
    }

    /// Resolve manifest entries to absolute URLs
    pub fn manifest_urls(&self) -> CacheResult<Vec<String>> {
        self.config
            .manifest
            .iter()
            .map(|entry| self.resolve(entry))
            .collect()
    }

    fn resolve(&self, entry: &str) -> CacheResult<String> {
        if let Ok(url) = reqwest::Url::parse(entry) {
            return Ok(url.to_string());
        }
        let base = self
            .base_url
            .as_ref()
            .ok_or_else(|| CacheError::InvalidManifest {
                entry: entry.to_string(),
                message: "Relative manifest entry without a ledger base URL".to_string(),
            })?;
        base.join(entry)
            .map(|url| url.to_string())
            .map_err(|e| CacheError::InvalidManifest {
                entry: entry.to_string(),
                message: e.to_string(),
            })
    }

    /// Fetch the whole manifest and store it under the version tag
    ///
    /// All assets are fetched before anything is written, so a failed install
    /// leaves storage untouched. Safe to re-run.
    pub async fn install(&self) -> CacheResult<usize> {
        let tag = self.config.version.as_str();
        let urls = self.manifest_urls()?;
        log::info!("Installing cache '{}' with {} assets", tag, urls.len());

        let requests: Vec<FetchRequest> = urls.iter().map(FetchRequest::get).collect();
        let results = join_all(requests.iter().map(|r| self.network.fetch(r))).await;

        let mut batch = Vec::with_capacity(results.len());
        for (request, result) in requests.into_iter().zip(results) {
            let response = result.map_err(|e| CacheError::install_fetch(tag, &request.url, &e))?;
            if !response.is_success() {
                let error = FetchError::Unreachable {
                    url: request.url.clone(),
                    message: format!("HTTP {}", response.status),
                };
                return Err(CacheError::install_fetch(tag, &request.url, &error));
            }
            batch.push((request.url, response));
        }

        let count = batch.len();
        self.storage.open(tag)?.put_all(batch)?;
        log::debug!("Cache '{}' seeded with {} entries", tag, count);
        Ok(count)
    }

    /// Make the installed generation current and purge every other one
    ///
    /// Returns the tags that were deleted.
    pub async fn activate(&self) -> CacheResult<Vec<String>> {
        let tag = self.config.version.as_str();
        let generation = self
            .storage
            .get(tag)?
            .ok_or_else(|| CacheError::NotInstalled {
                generation: tag.to_string(),
            })?;

        let mut deleted = Vec::new();
        for name in self.storage.keys()? {
            if name != tag && self.storage.delete(&name)? {
                log::debug!("Deleting old cache: {}", name);
                deleted.push(name);
            }
        }

        let mut active = handle_rwlock_write(self.active.write(), |message| {
            CacheError::Storage { message }
        })?;
        *active = Some(generation);
        log::info!("Cache '{}' active, {} old generations purged", tag, deleted.len());
        Ok(deleted)
    }

    /// Install then activate
    pub async fn start(&self) -> CacheResult<Vec<String>> {
        self.install().await?;
        self.activate().await
    }

    pub fn is_active(&self) -> bool {
        self.active_generation().is_some()
    }

    fn active_generation(&self) -> Option<Arc<CacheGeneration>> {
        handle_rwlock_read(self.active.read(), |message| CacheError::Storage { message })
            .ok()
            .and_then(|guard| guard.as_ref().map(Arc::clone))
    }

    /// Intercept one request
    ///
    /// Before activation requests still go through the strategy, but nothing
    /// is written back.
    pub async fn handle_fetch(&self, request: &FetchRequest) -> FetchResponse {
        let active = self.active_generation();
        respond(
            request,
            &self.storage,
            active.as_deref(),
            &self.config.policy,
            self.network.as_ref(),
        )
        .await
    }
}

#[async_trait::async_trait]
impl Network for OfflineCacheController {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        Ok(self.handle_fetch(request).await)
    }
}
