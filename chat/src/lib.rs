//! Streaming client for the chat backend.
//!
//! The backend exposes a single `/chat` endpoint that answers with an
//! incrementally framed body. [`HttpChatClient`] decodes that stream and
//! reports the accumulated assistant text after every event block. A
//! [`MockChatClient`] is provided for tests.

mod client;
mod message;

pub use client::{ChatClient, ChatEvent, ChatStream, HttpChatClient, MockChatClient};
pub use message::{ChatMessage, ChatRole};

use thiserror::Error;

/// Errors produced while issuing or decoding a streaming chat request.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("server returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed stream payload")]
    Decode,
}
