//! Ledger calls routed through the offline cache controller
//!
//! The HTTP ledger client talks to a fake service through the controller,
//! the way the binary wires it.

mod common;

use common::{FakeService, BASE_URL};
use fieldscan::core::time::MockTimeProvider;
use fieldscan::ledger::api::{AssetKind, HttpLedgerClient, LedgerClient, MemoryLedger, SessionId};
use fieldscan::offline::api::{
    CacheConfig, CacheStorage, FetchRequest, Network, OfflineCacheController, OFFLINE_BODY,
};
use fieldscan::session::api::{IdentifierState, ScanOutcome, ScanProfile, ScanSession};
use std::sync::Arc;
use std::time::Duration;

struct Rig {
    service: Arc<FakeService>,
    controller: Arc<OfflineCacheController>,
    session: ScanSession,
    clock: MockTimeProvider,
}

async fn rig(profile: ScanProfile, expected: &[&str]) -> Rig {
    let ledger = Arc::new(MemoryLedger::new());
    let session_id = SessionId::new("north_depot");
    if expected.is_empty() {
        ledger.open_list(&session_id);
    } else {
        ledger.open_validation(&session_id, expected.iter().copied());
    }
    let service = FakeService::new(ledger);
    let controller = Arc::new(
        OfflineCacheController::new(
            CacheConfig::default(),
            Some(BASE_URL),
            Arc::new(CacheStorage::new()),
            service.clone(),
        )
        .unwrap(),
    );
    controller.start().await.unwrap();

    let network: Arc<dyn Network> = controller.clone();
    let client: Arc<dyn LedgerClient> =
        Arc::new(HttpLedgerClient::new(network, BASE_URL, profile.asset));
    let clock = MockTimeProvider::new();
    let session = ScanSession::builder(session_id, profile, client)
        .clock(Arc::new(clock.clone()))
        .expected(expected.iter().copied())
        .build()
        .unwrap();

    Rig {
        service,
        controller,
        session,
        clock,
    }
}

#[tokio::test]
async fn test_collect_over_http() {
    let rig = rig(ScanProfile::scooter().unwrap(), &[]).await;

    let outcome = rig.session.process("https://tier.app/AB123").await;

    let ScanOutcome::Accepted { canonical_id, total, .. } = outcome else {
        panic!("expected acceptance, got {:?}", outcome);
    };
    assert_eq!(canonical_id, "AB123");
    assert_eq!(total, 1);
    assert_eq!(
        rig.service.ledger.recorded(&SessionId::new("north_depot")),
        vec!["AB123"]
    );
}

#[tokio::test]
async fn test_ledger_outage_leaves_session_untouched() {
    let rig = rig(ScanProfile::scooter().unwrap(), &[]).await;
    rig.service.set_offline(true);

    let outcome = rig.session.process("https://tier.app/AB123").await;

    assert!(matches!(outcome, ScanOutcome::Error { .. }), "{:?}", outcome);
    assert_eq!(
        rig.session.identifier_state("AB123").unwrap(),
        IdentifierState::Unseen
    );
    assert_eq!(rig.session.snapshot().unwrap().total, 0);

    rig.service.set_offline(false);
    rig.clock.advance_time(Duration::from_millis(1500));
    let retry = rig.session.process("https://tier.app/AB123").await;
    assert!(matches!(retry, ScanOutcome::Accepted { total: 1, .. }), "{:?}", retry);
}

#[tokio::test]
async fn test_validation_over_http() {
    let rig = rig(ScanProfile::validate(), &["AB123", "CD456"]).await;

    let first = rig.session.process("https://qr.tier-services.io/AB123").await;
    rig.clock.advance_time(Duration::from_millis(1100));
    let stranger = rig.session.process("ZZ999").await;

    assert_eq!(
        first,
        ScanOutcome::Validated {
            canonical_id: "AB123".to_string(),
            validated: 1,
            expected: 2,
        }
    );
    assert!(matches!(stranger, ScanOutcome::NotInList { .. }));
}

#[tokio::test]
async fn test_static_assets_survive_an_outage() {
    let rig = rig(ScanProfile::battery(), &[]).await;
    rig.service.set_offline(true);
    let hits_before = rig.service.hits();

    let style = rig
        .controller
        .fetch(&FetchRequest::get(format!("{}/static/css/style.css", BASE_URL)))
        .await
        .unwrap();
    let lists = rig
        .controller
        .fetch(&FetchRequest::get(format!("{}/lists", BASE_URL)))
        .await
        .unwrap();

    assert_eq!(style.status, 200);
    assert_eq!(style.text(), "asset /static/css/style.css");
    assert_eq!(lists.status, 504);
    assert_eq!(lists.text(), OFFLINE_BODY);
    // Only the dynamic route went to the network
    assert_eq!(rig.service.hits(), hits_before + 1);
}
