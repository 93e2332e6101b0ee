//! Adapters over platform speech capabilities.
//!
//! Speech recognition and synthesis are platform-provided and may be absent.
//! Both are abstracted behind injectable traits so the session controller
//! can run headless against deterministic doubles.

mod capture;
mod synth;

pub use capture::{
    CaptureAdapter, CaptureError, CaptureEvent, EngineEvent, NullEngine, RecognitionEngine,
    RecognitionResult, ScriptedEngine,
};
pub use synth::{NoopSynthesizer, Synthesizer, VoiceStyle};
