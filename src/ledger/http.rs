//! JSON-over-HTTP ledger client

use crate::ledger::client::LedgerClient;
use crate::ledger::error::{LedgerError, LedgerResult};
use crate::ledger::types::{AssetKind, LedgerId, LedgerPaths, LedgerReply, LedgerStatus, SessionId};
use crate::offline::{FetchRequest, Network};
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Ledger client posting JSON bodies through a [`Network`]
///
/// The network is usually the offline cache controller, so ledger calls get
/// the same network-first treatment as every other dynamic request. A
/// synthesized 504 from the controller surfaces here as [`LedgerError::Http`].
pub struct HttpLedgerClient {
    network: Arc<dyn Network>,
    base_url: String,
    paths: LedgerPaths,
    asset: AssetKind,
}

impl HttpLedgerClient {
    pub fn new(network: Arc<dyn Network>, base_url: impl Into<String>, asset: AssetKind) -> Self {
        Self {
            network,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            paths: LedgerPaths::default(),
            asset,
        }
    }

    pub fn with_paths(mut self, paths: LedgerPaths) -> Self {
        self.paths = paths;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn identifier_body(&self, session_id: &SessionId, identifier: &str) -> Value {
        let mut body = Map::new();
        body.insert("session_id".to_string(), json!(session_id.as_str()));
        body.insert(self.asset.field_name().to_string(), json!(identifier));
        Value::Object(body)
    }

    async fn post(&self, operation: &str, path: &str, body: Value) -> LedgerResult<LedgerReply> {
        let request = FetchRequest::post_json(self.url(path), &body);
        log::debug!("{}: POST {} {}", operation, request.url, body);

        let response = self.network.fetch(&request).await?;
        if !response.is_success() {
            return Err(LedgerError::Http {
                operation: operation.to_string(),
                status: response.status,
            });
        }

        let reply: LedgerReply =
            serde_json::from_slice(&response.body).map_err(|e| LedgerError::Malformed {
                operation: operation.to_string(),
                message: e.to_string(),
            })?;
        log::debug!("{}: reply {:?}", operation, reply);
        Ok(reply)
    }
}

#[async_trait::async_trait]
impl LedgerClient for HttpLedgerClient {
    async fn record_scan(
        &self,
        session_id: &SessionId,
        identifier: &str,
    ) -> LedgerResult<LedgerReply> {
        let body = self.identifier_body(session_id, identifier);
        let reply = self
            .post("record_scan", self.paths.record_path(self.asset), body)
            .await?;

        // An accepted scan without an id could never be deleted again
        if reply.status == LedgerStatus::Success && reply.ledger_id.is_none() {
            return Err(LedgerError::Malformed {
                operation: "record_scan".to_string(),
                message: "success reply without ledger_id".to_string(),
            });
        }
        Ok(reply)
    }

    async fn record_validation(
        &self,
        session_id: &SessionId,
        identifier: &str,
    ) -> LedgerResult<LedgerReply> {
        let body = self.identifier_body(session_id, identifier);
        self.post("record_validation", &self.paths.record_validation, body)
            .await
    }

    async fn delete_scan(&self, ledger_id: &LedgerId) -> LedgerResult<LedgerReply> {
        let body = json!({ "ledger_id": ledger_id.as_str() });
        self.post("delete_scan", &self.paths.delete_scan, body).await
    }

    async fn unvalidate_scooter(
        &self,
        session_id: &SessionId,
        identifier: &str,
    ) -> LedgerResult<LedgerReply> {
        let body = self.identifier_body(session_id, identifier);
        self.post("unvalidate_scooter", &self.paths.unvalidate, body)
            .await
    }
}
