//! Validate-mode classification

use super::support::{validate, validate_with};
use crate::ledger::api::{LedgerClient, MemoryLedger, SessionId};
use crate::session::api::{
    DuplicateOrigin, IdentifierState, ScanOutcome, ScanProfile, ScanSession, SessionError,
    UnvalidateOutcome,
};
use std::sync::Arc;

#[tokio::test]
async fn test_validation_scenario() {
    let fx = validate(&["X", "Y"]);

    assert_eq!(
        fx.scan_at(0, "Z").await,
        ScanOutcome::NotInList {
            canonical_id: "Z".to_string()
        }
    );
    assert_eq!(
        fx.scan_at(1000, "X").await,
        ScanOutcome::Validated {
            canonical_id: "X".to_string(),
            validated: 1,
            expected: 2,
        }
    );
    assert_eq!(
        fx.scan_at(2000, "X").await,
        ScanOutcome::Duplicate {
            canonical_id: "X".to_string(),
            origin: DuplicateOrigin::Local,
        }
    );

    let undone = fx.session.unvalidate("X", |_| true).await.unwrap();

    assert_eq!(
        undone,
        UnvalidateOutcome::Unvalidated {
            canonical_id: "X".to_string(),
            validated: 0,
        }
    );
    assert_eq!(
        fx.session.identifier_state("X").unwrap(),
        IdentifierState::Unseen
    );
}

#[tokio::test]
async fn test_not_in_list_regardless_of_scan_count() {
    let fx = validate(&["X"]);

    for attempt in 0..5u64 {
        let outcome = fx.scan_at(attempt * 1000, "https://tier.app/NOPE1").await;
        assert_eq!(
            outcome,
            ScanOutcome::NotInList {
                canonical_id: "NOPE1".to_string()
            }
        );
    }
    assert_eq!(fx.ledger.call_count(), 0);
}

#[tokio::test]
async fn test_prefixed_scan_matches_short_expected_id() {
    let fx = validate(&["https://tier.app/AB123", "CD456"]);

    let outcome = fx.scan_at(0, "https://qr.tier-services.io/AB123").await;

    assert!(matches!(outcome, ScanOutcome::Validated { validated: 1, .. }));
    assert_eq!(fx.session.snapshot().unwrap().remaining(), 1);
}

#[tokio::test]
async fn test_listed_id_failing_prefix_rule_is_invalid() {
    let mut profile = ScanProfile::validate();
    profile.normalizer.require_prefix = true;
    let fx = validate_with(profile, &["https://tier.app/AB123"]);

    let bare = fx.scan_at(0, "AB123").await;
    let stranger = fx.scan_at(1000, "ZZ999").await;

    assert_eq!(bare, ScanOutcome::Invalid { raw: "AB123".to_string() });
    assert_eq!(
        stranger,
        ScanOutcome::NotInList {
            canonical_id: "ZZ999".to_string()
        }
    );
    assert_eq!(fx.ledger.call_count(), 0);
    assert_eq!(
        fx.session.identifier_state("AB123").unwrap(),
        IdentifierState::Unseen
    );

    let scanned = fx.scan_at(2000, "https://tier.app/AB123").await;
    assert!(matches!(scanned, ScanOutcome::Validated { validated: 1, .. }));
}

#[tokio::test]
async fn test_remote_duplicate_leaves_local_state() {
    let fx = validate(&["X"]);
    fx.ledger
        .record_validation(&SessionId::new("s-1"), "X")
        .await
        .unwrap();

    let outcome = fx.scan_at(0, "X").await;

    assert!(matches!(
        outcome,
        ScanOutcome::Duplicate {
            origin: DuplicateOrigin::Remote,
            ..
        }
    ));
    assert_eq!(fx.session.snapshot().unwrap().validated_count, 0);
}

#[tokio::test]
async fn test_unvalidate_requires_confirmation() {
    let fx = validate(&["X"]);
    fx.scan_at(0, "X").await;
    let calls = fx.ledger.call_count();

    let mut asked = None;
    let outcome = fx
        .session
        .unvalidate("X", |id| {
            asked = Some(id.to_string());
            false
        })
        .await
        .unwrap();

    assert_eq!(outcome, UnvalidateOutcome::Cancelled);
    assert_eq!(asked.as_deref(), Some("X"));
    assert_eq!(fx.ledger.call_count(), calls);
    assert_eq!(fx.session.snapshot().unwrap().validated_count, 1);
}

#[tokio::test]
async fn test_failed_unvalidate_keeps_count() {
    let fx = validate(&["X"]);
    fx.scan_at(0, "X").await;
    fx.ledger.set_offline(true);

    let outcome = fx.session.unvalidate("X", |_| true).await.unwrap();

    assert!(matches!(outcome, UnvalidateOutcome::Failed { .. }));
    let snapshot = fx.session.snapshot().unwrap();
    assert_eq!(snapshot.validated_count, 1);
    assert!(snapshot.is_validated("X"));
}

#[tokio::test]
async fn test_unvalidate_of_unvalidated_id() {
    let fx = validate(&["X"]);

    let result = fx.session.unvalidate("X", |_| true).await;

    assert!(matches!(result, Err(SessionError::NotValidated { .. })));
}

#[tokio::test]
async fn test_mode_specific_operations() {
    let fx = validate(&["X"]);
    let delete = fx
        .session
        .delete_scan(&crate::ledger::api::LedgerId::new("scan-1"))
        .await;
    assert!(matches!(delete, Err(SessionError::WrongMode { .. })));

    let ledger = Arc::new(MemoryLedger::new());
    let collect = ScanSession::builder(SessionId::new("c"), ScanProfile::battery(), ledger)
        .build()
        .unwrap();
    let unvalidate = collect.unvalidate("X", |_| true).await;
    assert!(matches!(unvalidate, Err(SessionError::WrongMode { .. })));
}

#[test]
fn test_collect_profile_rejects_expected_list() {
    let ledger = Arc::new(MemoryLedger::new());
    let result = ScanSession::builder(SessionId::new("c"), ScanProfile::battery(), ledger)
        .expected(["X"])
        .build();

    assert!(matches!(result, Err(SessionError::Configuration { .. })));
}

#[test]
fn test_zero_delay_is_rejected() {
    let ledger = Arc::new(MemoryLedger::new());
    let result = ScanSession::builder(SessionId::new("c"), ScanProfile::battery(), ledger)
        .delay(std::time::Duration::ZERO)
        .build();

    assert!(matches!(result, Err(SessionError::Configuration { .. })));
}
