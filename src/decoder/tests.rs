//! Tests for the decoder adapter

use crate::decoder::api::{ChannelDecoder, DecoderAdapter, LineDecoder, ScanSource};
use std::time::Duration;
use tokio::io::BufReader;
use tokio::time::timeout;

#[tokio::test]
async fn test_adapter_starts_decoder_on_first_next() {
    let (decoder, sender) = ChannelDecoder::new(ScanSource::Camera);
    let (mut adapter, _control) = DecoderAdapter::new(Box::new(decoder));
    assert!(!sender.is_decoding());

    let pending = tokio::spawn(async move {
        let event = adapter.next().await.unwrap();
        (adapter, event)
    });
    while !sender.is_decoding() {
        tokio::task::yield_now().await;
    }
    assert!(sender.offer("https://tier.app/AB123"));

    let (adapter, event) = pending.await.unwrap();
    assert!(adapter.is_running());
    assert_eq!(event.unwrap().data, "https://tier.app/AB123");
}

#[tokio::test]
async fn test_pause_stops_decoding_and_resume_restarts() {
    let (decoder, sender) = ChannelDecoder::new(ScanSource::Camera);
    let (mut adapter, control) = DecoderAdapter::new(Box::new(decoder));

    control.pause();
    let waiting = timeout(Duration::from_millis(50), adapter.next()).await;
    assert!(waiting.is_err(), "paused adapter must wait");
    assert!(!sender.offer("frame while paused"));

    control.resume();
    let task = tokio::spawn(async move { adapter.next().await });
    while !sender.is_decoding() {
        tokio::task::yield_now().await;
    }
    sender.offer("after resume");

    let event = task.await.unwrap().unwrap().unwrap();
    assert_eq!(event.data, "after resume");
}

#[tokio::test]
async fn test_pause_while_waiting_for_frames() {
    let (decoder, sender) = ChannelDecoder::new(ScanSource::Camera);
    let (mut adapter, control) = DecoderAdapter::new(Box::new(decoder));

    let task = tokio::spawn(async move {
        let result = timeout(Duration::from_millis(200), adapter.next()).await;
        (adapter, result.is_err())
    });
    while !sender.is_decoding() {
        tokio::task::yield_now().await;
    }
    control.pause();

    let (adapter, timed_out) = task.await.unwrap();
    assert!(timed_out);
    assert!(!adapter.is_running());
    assert!(!sender.is_decoding());
}

#[tokio::test]
async fn test_line_replay_ends_stream() {
    let input = "AB123\n\nCD456\n";
    let decoder = LineDecoder::new(BufReader::new(input.as_bytes()), ScanSource::Camera);
    let (mut adapter, _control) = DecoderAdapter::new(Box::new(decoder));

    let mut seen = Vec::new();
    while let Some(event) = adapter.next().await.unwrap() {
        seen.push(event.data);
    }

    assert_eq!(seen, vec!["AB123", "CD456"]);
}

#[tokio::test]
async fn test_dropped_control_while_paused_ends_stream() {
    let (decoder, _sender) = ChannelDecoder::new(ScanSource::Camera);
    let (mut adapter, control) = DecoderAdapter::new(Box::new(decoder));
    control.pause();
    drop(control);

    let result = timeout(Duration::from_millis(100), adapter.next()).await;

    assert!(matches!(result, Ok(Ok(None))));
}
