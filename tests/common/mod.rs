//! Common test utilities
//!
//! [`FakeService`] stands in for the ledger web service: it answers the
//! ledger endpoints from a [`MemoryLedger`] and serves static assets, and can
//! be switched offline to exercise the cache fallback.

#![allow(dead_code)]

use fieldscan::ledger::api::{LedgerClient, LedgerId, LedgerReply, LedgerResult, MemoryLedger, SessionId};
use fieldscan::offline::api::{FetchError, FetchRequest, FetchResponse, Method, Network};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

pub const BASE_URL: &str = "https://scan.example.org";

pub struct FakeService {
    pub ledger: Arc<MemoryLedger>,
    offline: AtomicBool,
    hits: AtomicUsize,
}

impl FakeService {
    pub fn new(ledger: Arc<MemoryLedger>) -> Arc<Self> {
        Arc::new(Self {
            ledger,
            offline: AtomicBool::new(false),
            hits: AtomicUsize::new(0),
        })
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    fn field<'a>(body: &'a Value, names: &[&str]) -> &'a str {
        names
            .iter()
            .find_map(|name| body.get(*name).and_then(Value::as_str))
            .unwrap_or_default()
    }

    async fn ledger_call(&self, path: &str, body: &Value) -> LedgerResult<LedgerReply> {
        let session = SessionId::new(Self::field(body, &["session_id"]));
        let id = Self::field(body, &["scooter_id", "battery_id"]);
        match path {
            "/save_scan" | "/save_battery_scan" => self.ledger.record_scan(&session, id).await,
            "/save_validation" => self.ledger.record_validation(&session, id).await,
            "/delete_scan" => {
                self.ledger
                    .delete_scan(&LedgerId::new(Self::field(body, &["ledger_id"])))
                    .await
            }
            _ => self.ledger.unvalidate_scooter(&session, id).await,
        }
    }
}

#[async_trait::async_trait]
impl Network for FakeService {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        self.hits.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(FetchError::Unreachable {
                url: request.url.clone(),
                message: "connection refused".to_string(),
            });
        }

        let path = request.path();
        if request.method == Method::GET {
            return Ok(FetchResponse::new(200, format!("asset {}", path)));
        }

        let body: Value = request
            .body
            .as_deref()
            .and_then(|b| serde_json::from_slice(b).ok())
            .unwrap_or(Value::Null);
        match self.ledger_call(&path, &body).await {
            Ok(reply) => Ok(FetchResponse::json(&serde_json::to_value(reply).unwrap_or(Value::Null))),
            Err(e) => Ok(FetchResponse::new(500, e.to_string())),
        }
    }
}
