use async_trait::async_trait;

/// Fixed locale and rate applied to synthesized utterances.
#[derive(Clone, Debug)]
pub struct VoiceStyle {
    pub language: String,
    pub rate: f32,
}

impl Default for VoiceStyle {
    fn default() -> Self {
        Self {
            language: "ar-SA".into(),
            rate: 1.0,
        }
    }
}

/// Speech-synthesis capability.
///
/// `speak` cancels any utterance in progress before starting the new one,
/// so callers may invoke it in quick succession without overlap.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn speak(&self, text: &str);
    /// Stop the current utterance without starting a new one.
    async fn cancel(&self);
}

/// Synthesizer used when the platform provides no synthesis capability.
/// Narration silently degrades to nothing.
pub struct NoopSynthesizer;

#[async_trait]
impl Synthesizer for NoopSynthesizer {
    async fn speak(&self, _text: &str) {}

    async fn cancel(&self) {}
}
