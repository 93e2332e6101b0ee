use crate::{ChatError, ChatMessage};
use async_trait::async_trait;
use futures_core::Stream;
use futures_util::StreamExt;
use serde::Serialize;
use std::pin::Pin;
use tracing::debug;

/// Prefix marking an event block that carries response text.
const DATA_PREFIX: &str = "data: ";
/// Blank line separating event blocks in the response body.
const BLOCK_DELIMITER: &[u8] = b"\n\n";

/// One update from an in-flight chat request.
///
/// `Partial` carries the full accumulated text so far, not just the newest
/// suffix; consumers replace their display state wholesale on every update.
/// `Done` terminates the stream with the final accumulation, and nothing
/// follows it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatEvent {
    Partial(String),
    Done(String),
}

pub type ChatStream = Pin<Box<dyn Stream<Item = Result<ChatEvent, ChatError>> + Send>>;

/// Interface for streaming chat completions.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn stream_chat(
        &self,
        model: &str,
        history: &[ChatMessage],
    ) -> Result<ChatStream, ChatError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

/// Implementation of [`ChatClient`] that talks to the backend over HTTP.
///
/// Cancellation is drop-based: dropping the returned stream aborts the
/// underlying transfer.
pub struct HttpChatClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpChatClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ChatClient for HttpChatClient {
    async fn stream_chat(
        &self,
        model: &str,
        history: &[ChatMessage],
    ) -> Result<ChatStream, ChatError> {
        let url = format!("{}/chat", self.base_url);
        let resp = self
            .client
            .post(url)
            .json(&ChatRequest {
                model,
                messages: history,
                stream: true,
            })
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ChatError::Status(status));
        }
        let mut body = resp.bytes_stream();
        let stream = async_stream::stream! {
            let mut buf: Vec<u8> = Vec::new();
            let mut accumulated = String::new();
            while let Some(chunk) = body.next().await {
                let bytes = match chunk {
                    Ok(b) => b,
                    Err(e) => {
                        yield Err(ChatError::Network(e));
                        return;
                    }
                };
                buf.extend_from_slice(&bytes);
                while let Some(end) = find_delimiter(&buf) {
                    let block = buf[..end].to_vec();
                    buf.drain(..end + BLOCK_DELIMITER.len());
                    match append_block(&block, &mut accumulated) {
                        Ok(true) => yield Ok(ChatEvent::Partial(accumulated.clone())),
                        Ok(false) => {}
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    }
                }
            }
            // The last block may arrive without a trailing delimiter.
            if !buf.is_empty() {
                match append_block(&buf, &mut accumulated) {
                    Ok(true) => yield Ok(ChatEvent::Partial(accumulated.clone())),
                    Ok(false) => {}
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }
            yield Ok(ChatEvent::Done(accumulated));
        };
        Ok(Box::pin(stream))
    }
}

fn find_delimiter(buf: &[u8]) -> Option<usize> {
    buf.windows(BLOCK_DELIMITER.len())
        .position(|w| w == BLOCK_DELIMITER)
}

/// Append a block's payload to `accumulated` if it carries the data prefix.
/// Returns `Ok(true)` when text was appended.
fn append_block(block: &[u8], accumulated: &mut String) -> Result<bool, ChatError> {
    let text = std::str::from_utf8(block).map_err(|_| ChatError::Decode)?;
    match text.strip_prefix(DATA_PREFIX) {
        Some(payload) => {
            accumulated.push_str(payload);
            Ok(true)
        }
        None => {
            debug!(block = %text, "ignoring unrecognized event block");
            Ok(false)
        }
    }
}

/// Scripted in-memory client used in tests.
///
/// Replays the given partial snapshots in order, then either completes with
/// the final text or fails without completing.
pub struct MockChatClient {
    partials: Vec<String>,
    finale: Option<String>,
}

impl MockChatClient {
    pub fn new(partials: Vec<String>, finale: impl Into<String>) -> Self {
        Self {
            partials,
            finale: Some(finale.into()),
        }
    }

    /// A client whose stream errors out instead of completing.
    pub fn failing(partials: Vec<String>) -> Self {
        Self {
            partials,
            finale: None,
        }
    }
}

#[async_trait]
impl ChatClient for MockChatClient {
    async fn stream_chat(
        &self,
        _model: &str,
        _history: &[ChatMessage],
    ) -> Result<ChatStream, ChatError> {
        let mut items: Vec<Result<ChatEvent, ChatError>> = self
            .partials
            .iter()
            .cloned()
            .map(|p| Ok(ChatEvent::Partial(p)))
            .collect();
        match &self.finale {
            Some(text) => items.push(Ok(ChatEvent::Done(text.clone()))),
            None => items.push(Err(ChatError::Decode)),
        }
        Ok(Box::pin(tokio_stream::iter(items)))
    }
}
