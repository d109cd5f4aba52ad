//! Decoder-to-session pipeline

use super::support::{collect, GatedLedger};
use crate::core::shutdown::ShutdownCoordinator;
use crate::decoder::api::{ChannelDecoder, DecodedEvent, DecoderAdapter, LineDecoder, ScanSource};
use crate::ledger::api::SessionId;
use crate::session::api::{PipelineExit, ScanOutcome, ScanPipeline, ScanProfile, ScanSession};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;

#[tokio::test]
async fn test_replay_through_pipeline() {
    let fx = collect(ScanProfile::scooter().unwrap());
    let input = "https://tier.app/AB123\nhttps://tier.app/AB123\n";
    let decoder = LineDecoder::new(BufReader::new(input.as_bytes()), ScanSource::Camera);
    let (mut adapter, _control) = DecoderAdapter::new(Box::new(decoder));
    let (mut pipeline, mut reports) = ScanPipeline::new(Arc::clone(&fx.session));
    let (_coordinator, mut shutdown) = ShutdownCoordinator::new();

    let exit = pipeline.run(&mut adapter, &mut shutdown).await.unwrap();
    pipeline.drain().await;

    assert_eq!(exit, PipelineExit::InputEnded);
    let mut outcomes = Vec::new();
    while let Ok(report) = reports.try_recv() {
        outcomes.push(report.outcome);
    }
    // The clock does not move, so the repeated frame is throttled
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.contains(&ScanOutcome::ThrottledDrop));
    assert!(outcomes
        .iter()
        .any(|o| matches!(o, ScanOutcome::Accepted { total: 1, .. })));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_local_duplicate_frees_throttle_before_next_scan() {
    let fx = collect(ScanProfile::battery());
    let (mut pipeline, mut reports) = ScanPipeline::new(Arc::clone(&fx.session));

    pipeline.submit(DecodedEvent::camera("A"));
    pipeline.drain().await;
    assert!(matches!(
        reports.recv().await.unwrap().outcome,
        ScanOutcome::Accepted { total: 1, .. }
    ));

    fx.clock.set_elapsed_millis(1500);
    pipeline.submit(DecodedEvent::camera("A"));
    // Settled without spawning, so the report is already there
    assert_eq!(pipeline.pending(), 0);
    assert!(matches!(
        reports.try_recv().unwrap().outcome,
        ScanOutcome::Duplicate { .. }
    ));

    fx.clock.set_elapsed_millis(1600);
    pipeline.submit(DecodedEvent::camera("B"));
    assert_eq!(pipeline.pending(), 1);
    pipeline.drain().await;

    assert!(matches!(
        reports.recv().await.unwrap().outcome,
        ScanOutcome::Accepted { total: 2, .. }
    ));
    assert_eq!(fx.ledger.call_count(), 2);
}

#[tokio::test]
async fn test_shutdown_leaves_loop_and_drain_finishes_calls() {
    let ledger = Arc::new(GatedLedger::closed());
    ledger.inner.open_list(&SessionId::new("s-1"));
    let session = Arc::new(
        ScanSession::builder(SessionId::new("s-1"), ScanProfile::battery(), ledger.clone())
            .build()
            .unwrap(),
    );
    let (decoder, frames) = ChannelDecoder::new(ScanSource::Camera);
    let (mut adapter, _control) = DecoderAdapter::new(Box::new(decoder));
    let (mut pipeline, mut reports) = ScanPipeline::new(Arc::clone(&session));
    let (coordinator, mut shutdown) = ShutdownCoordinator::new();

    let runner = tokio::spawn(async move {
        let exit = pipeline.run(&mut adapter, &mut shutdown).await.unwrap();
        (pipeline, exit)
    });
    while !frames.is_decoding() {
        tokio::task::yield_now().await;
    }
    frames.offer("BAT-1");
    while session.in_flight().unwrap() == 0 {
        tokio::task::yield_now().await;
    }

    coordinator.trigger_shutdown();
    let (mut pipeline, exit) = runner.await.unwrap();
    assert_eq!(exit, PipelineExit::Shutdown);

    ledger.gate.add_permits(1);
    tokio::time::timeout(Duration::from_secs(5), pipeline.drain())
        .await
        .unwrap();

    let report = reports.recv().await.unwrap();
    assert_eq!(report.event, DecodedEvent::camera("BAT-1"));
    assert!(matches!(report.outcome, ScanOutcome::Accepted { .. }));
    assert_eq!(session.snapshot().unwrap().total, 1);
}
