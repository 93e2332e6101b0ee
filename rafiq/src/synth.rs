use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use speech::{Synthesizer, VoiceStyle};
use std::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Client for an HTTP text-to-speech server.
///
/// Each `speak` aborts the previous in-flight request before issuing the
/// next one, so at most one utterance is being synthesized at a time.
pub struct HttpSynthesizer {
    url: String,
    client: Client,
    style: VoiceStyle,
    in_flight: Mutex<Option<JoinHandle<()>>>,
}

#[derive(Serialize)]
struct TtsRequest<'a> {
    text: &'a str,
    language: &'a str,
    rate: f32,
}

impl HttpSynthesizer {
    pub fn new(base_url: impl Into<String>, style: VoiceStyle) -> Self {
        Self {
            url: format!("{}/api/tts", base_url.into()),
            client: Client::new(),
            style,
            in_flight: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Synthesizer for HttpSynthesizer {
    async fn speak(&self, text: &str) {
        if let Some(previous) = self.in_flight.lock().unwrap().take() {
            previous.abort();
        }
        let url = self.url.clone();
        let client = self.client.clone();
        let text = text.to_string();
        let language = self.style.language.clone();
        let rate = self.style.rate;
        let task = tokio::spawn(async move {
            let payload = TtsRequest {
                text: &text,
                language: &language,
                rate,
            };
            match client.post(&url).json(&payload).send().await {
                Ok(resp) => debug!(status = %resp.status(), "tts request finished"),
                Err(e) => error!(%e, "tts request failed"),
            }
        });
        *self.in_flight.lock().unwrap() = Some(task);
    }

    async fn cancel(&self) {
        if let Some(task) = self.in_flight.lock().unwrap().take() {
            task.abort();
        }
    }
}
