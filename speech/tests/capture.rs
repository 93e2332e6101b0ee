use std::sync::Arc;

use speech::{
    CaptureAdapter, CaptureError, CaptureEvent, EngineEvent, NullEngine, RecognitionResult,
    ScriptedEngine,
};
use tokio::sync::mpsc;

fn final_result(text: &str) -> RecognitionResult {
    RecognitionResult {
        transcript: text.into(),
        is_final: true,
    }
}

fn interim_result(text: &str) -> RecognitionResult {
    RecognitionResult {
        transcript: text.into(),
        is_final: false,
    }
}

/// Let the adapter's pump task drain whatever is queued.
async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn partitions_finals_and_interims() {
    let (engine_tx, engine_rx) = mpsc::unbounded_channel();
    let engine = Arc::new(ScriptedEngine::new(
        engine_tx,
        vec![vec![EngineEvent::Results(vec![
            final_result("مرحبا"),
            interim_result("بكم"),
        ])]],
    ));
    let (out_tx, mut out_rx) = mpsc::unbounded_channel();
    let adapter = CaptureAdapter::new(engine, engine_rx, out_tx);

    adapter.start().unwrap();
    assert!(adapter.active());
    assert_eq!(out_rx.recv().await.unwrap(), CaptureEvent::Chunk("مرحبا".into()));
    assert_eq!(out_rx.recv().await.unwrap(), CaptureEvent::Preview("بكم".into()));
}

#[tokio::test]
async fn concatenates_final_group_in_event_order() {
    let (engine_tx, engine_rx) = mpsc::unbounded_channel();
    let engine = Arc::new(ScriptedEngine::new(
        engine_tx,
        vec![vec![EngineEvent::Results(vec![
            final_result("ما"),
            final_result(" أفضل"),
        ])]],
    ));
    let (out_tx, mut out_rx) = mpsc::unbounded_channel();
    let adapter = CaptureAdapter::new(engine, engine_rx, out_tx);

    adapter.start().unwrap();
    assert_eq!(out_rx.recv().await.unwrap(), CaptureEvent::Chunk("ما أفضل".into()));
    assert_eq!(out_rx.recv().await.unwrap(), CaptureEvent::Preview(String::new()));
}

#[tokio::test]
async fn preview_is_emitted_per_event_as_full_replacement() {
    let (engine_tx, engine_rx) = mpsc::unbounded_channel();
    let engine = Arc::new(ScriptedEngine::new(
        engine_tx,
        vec![vec![
            EngineEvent::Results(vec![interim_result("الت")]),
            EngineEvent::Results(vec![interim_result("التدوير")]),
            EngineEvent::Results(vec![]),
        ]],
    ));
    let (out_tx, mut out_rx) = mpsc::unbounded_channel();
    let adapter = CaptureAdapter::new(engine, engine_rx, out_tx);

    adapter.start().unwrap();
    assert_eq!(out_rx.recv().await.unwrap(), CaptureEvent::Preview("الت".into()));
    assert_eq!(out_rx.recv().await.unwrap(), CaptureEvent::Preview("التدوير".into()));
    // An event with no results still clears the preview.
    assert_eq!(out_rx.recv().await.unwrap(), CaptureEvent::Preview(String::new()));
}

#[tokio::test]
async fn restarts_when_the_engine_ends_while_capture_is_on() {
    let (engine_tx, engine_rx) = mpsc::unbounded_channel();
    let engine = Arc::new(ScriptedEngine::new(
        engine_tx,
        vec![
            vec![
                EngineEvent::Results(vec![final_result("one")]),
                EngineEvent::Ended,
            ],
            vec![EngineEvent::Results(vec![final_result("two")])],
        ],
    ));
    let (out_tx, mut out_rx) = mpsc::unbounded_channel();
    let adapter = CaptureAdapter::new(engine.clone(), engine_rx, out_tx);

    adapter.start().unwrap();
    assert_eq!(out_rx.recv().await.unwrap(), CaptureEvent::Chunk("one".into()));
    assert_eq!(out_rx.recv().await.unwrap(), CaptureEvent::Preview(String::new()));
    // The segment after the auto-restart.
    assert_eq!(out_rx.recv().await.unwrap(), CaptureEvent::Chunk("two".into()));
    assert_eq!(out_rx.recv().await.unwrap(), CaptureEvent::Preview(String::new()));
    assert_eq!(engine.starts(), 2);
    assert!(adapter.active());
}

#[tokio::test]
async fn stop_cancels_the_pending_restart() {
    let (engine_tx, engine_rx) = mpsc::unbounded_channel();
    let engine = Arc::new(ScriptedEngine::new(engine_tx, vec![vec![EngineEvent::Ended]]));
    let (out_tx, mut out_rx) = mpsc::unbounded_channel();
    let adapter = CaptureAdapter::new(engine.clone(), engine_rx, out_tx);

    adapter.start().unwrap();
    // Stop lands before the pump sees the trailing end event.
    adapter.stop();
    settle().await;

    assert_eq!(engine.starts(), 1);
    assert!(!adapter.active());
    assert!(out_rx.try_recv().is_err());
}

#[tokio::test]
async fn unsupported_engine_leaves_capture_off() {
    let (_engine_tx, engine_rx) = mpsc::unbounded_channel::<EngineEvent>();
    let (out_tx, _out_rx) = mpsc::unbounded_channel();
    let adapter = CaptureAdapter::new(Arc::new(NullEngine), engine_rx, out_tx);

    assert!(matches!(adapter.start(), Err(CaptureError::Unsupported)));
    assert!(!adapter.active());
}
