use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Errors reported by a recognition engine.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("speech recognition is not available on this platform")]
    Unsupported,
    #[error("recognition engine failed: {0}")]
    Engine(String),
}

/// One candidate transcript from a recognition event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub transcript: String,
    /// Whether the engine has committed to this transcript.
    pub is_final: bool,
}

/// Raw events delivered by a [`RecognitionEngine`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineEvent {
    /// A batch of results, mixing final and interim transcripts.
    Results(Vec<RecognitionResult>),
    /// The engine stopped on its own, typically at the end of a speech
    /// segment.
    Ended,
}

/// Normalized capture signals handed to the session controller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptureEvent {
    /// Text the engine has committed to, ready to join the composition
    /// buffer.
    Chunk(String),
    /// The current interim guess, replacing any previous preview in full.
    Preview(String),
}

/// Continuous speech-recognition capability.
///
/// Engines push [`EngineEvent`]s into the channel they were constructed
/// with; `start` arms (or re-arms) the engine and `stop` ends capture.
pub trait RecognitionEngine: Send + Sync {
    fn start(&self) -> Result<(), CaptureError>;
    fn stop(&self);
}

/// Normalizes a [`RecognitionEngine`]'s event stream into [`CaptureEvent`]s
/// and keeps continuous capture armed across engine restarts.
pub struct CaptureAdapter {
    engine: Arc<dyn RecognitionEngine>,
    desired: Arc<AtomicBool>,
    pump: tokio::task::JoinHandle<()>,
}

impl CaptureAdapter {
    /// Wire `engine`, delivering raw events on `events`, to `out`.
    pub fn new(
        engine: Arc<dyn RecognitionEngine>,
        events: mpsc::UnboundedReceiver<EngineEvent>,
        out: mpsc::UnboundedSender<CaptureEvent>,
    ) -> Self {
        let desired = Arc::new(AtomicBool::new(false));
        let pump = tokio::spawn(Self::pump(engine.clone(), events, out, desired.clone()));
        Self {
            engine,
            desired,
            pump,
        }
    }

    /// Begin continuous capture.
    pub fn start(&self) -> Result<(), CaptureError> {
        self.desired.store(true, Ordering::SeqCst);
        if let Err(e) = self.engine.start() {
            self.desired.store(false, Ordering::SeqCst);
            return Err(e);
        }
        Ok(())
    }

    /// End capture and cancel any pending auto-restart.
    pub fn stop(&self) {
        self.desired.store(false, Ordering::SeqCst);
        self.engine.stop();
    }

    /// Whether capture is currently toggled on.
    pub fn active(&self) -> bool {
        self.desired.load(Ordering::SeqCst)
    }

    async fn pump(
        engine: Arc<dyn RecognitionEngine>,
        mut events: mpsc::UnboundedReceiver<EngineEvent>,
        out: mpsc::UnboundedSender<CaptureEvent>,
        desired: Arc<AtomicBool>,
    ) {
        while let Some(event) = events.recv().await {
            match event {
                EngineEvent::Results(results) => {
                    let mut finals = String::new();
                    let mut interim = String::new();
                    for r in &results {
                        if r.is_final {
                            finals.push_str(&r.transcript);
                        } else {
                            interim.push_str(&r.transcript);
                        }
                    }
                    let finals = finals.trim();
                    if !finals.is_empty() {
                        let _ = out.send(CaptureEvent::Chunk(finals.to_string()));
                    }
                    let _ = out.send(CaptureEvent::Preview(interim));
                }
                EngineEvent::Ended => {
                    // Re-arm only while capture is still toggled on: a stop
                    // followed by the engine's own end event must not restart.
                    if desired.load(Ordering::SeqCst) {
                        debug!("engine ended while capture is on, restarting");
                        if let Err(e) = engine.start() {
                            warn!(%e, "engine restart failed");
                            desired.store(false, Ordering::SeqCst);
                        }
                    }
                }
            }
        }
    }
}

impl Drop for CaptureAdapter {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

/// Engine used when the platform provides no recognition capability.
pub struct NullEngine;

impl RecognitionEngine for NullEngine {
    fn start(&self) -> Result<(), CaptureError> {
        Err(CaptureError::Unsupported)
    }

    fn stop(&self) {}
}

/// Deterministic engine double that plays one queued event segment per
/// `start` call. Used in tests.
pub struct ScriptedEngine {
    tx: mpsc::UnboundedSender<EngineEvent>,
    segments: Mutex<VecDeque<Vec<EngineEvent>>>,
    starts: AtomicUsize,
}

impl ScriptedEngine {
    pub fn new(tx: mpsc::UnboundedSender<EngineEvent>, segments: Vec<Vec<EngineEvent>>) -> Self {
        Self {
            tx,
            segments: Mutex::new(segments.into()),
            starts: AtomicUsize::new(0),
        }
    }

    /// Number of times `start` has been called.
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }
}

impl RecognitionEngine for ScriptedEngine {
    fn start(&self) -> Result<(), CaptureError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        let segment = self.segments.lock().unwrap().pop_front();
        if let Some(events) = segment {
            for event in events {
                let _ = self.tx.send(event);
            }
        }
        Ok(())
    }

    fn stop(&self) {}
}
