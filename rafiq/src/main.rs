use std::sync::Arc;

use anyhow::Result;
use chat::HttpChatClient;
use clap::Parser;
use dotenvy::dotenv;
use session::{GREETING, MODELS, Session, SessionInput};
use speech::{CaptureAdapter, NoopSynthesizer, NullEngine, Synthesizer, VoiceStyle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

mod render;
mod synth;

use synth::HttpSynthesizer;

/// Voice-and-text chat client for the assistant backend.
#[derive(Parser)]
struct Args {
    /// Base URL of the chat backend.
    #[arg(long, env = "BACKEND_URL", default_value = "http://localhost:8000")]
    backend_url: String,
    /// Base URL of the speech-synthesis server; narration is disabled when
    /// unset.
    #[arg(long, env = "TTS_URL")]
    tts_url: Option<String>,
    /// Model used for requests.
    #[arg(long, env = "MODEL", default_value = "llama3.1")]
    model: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    let args = Args::parse();

    let chat = Arc::new(HttpChatClient::new(&args.backend_url));
    let synth: Arc<dyn Synthesizer> = match &args.tts_url {
        Some(url) => Arc::new(HttpSynthesizer::new(url, VoiceStyle::default())),
        None => Arc::new(NoopSynthesizer),
    };
    // This build carries no speech-recognition capability; toggling the
    // microphone surfaces the unsupported notice.
    let (_engine_tx, engine_rx) = mpsc::unbounded_channel();
    let (capture_tx, capture_rx) = mpsc::unbounded_channel();
    let capture = CaptureAdapter::new(Arc::new(NullEngine), engine_rx, capture_tx);

    let session = Session::new(chat, synth, capture, capture_rx);
    let input = session.input_sender();
    let events = session.subscribe();
    let log = session.log_handle();
    let buffer = session.composition();
    let session_task = tokio::spawn(session.run());
    let render_task = tokio::spawn(render::render(events, log, buffer));

    if args.model != MODELS[0] {
        input.send(SessionInput::SetModel(args.model.clone()))?;
    }

    println!("المساعد: {GREETING}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => {}
            ":quit" => break,
            ":cancel" => input.send(SessionInput::Cancel)?,
            ":mic" => input.send(SessionInput::ToggleCapture)?,
            _ => {
                if let Some(model) = line.strip_prefix(":model ") {
                    input.send(SessionInput::SetModel(model.trim().to_string()))?;
                } else {
                    input.send(SessionInput::SetText(line.to_string()))?;
                    input.send(SessionInput::Submit)?;
                }
            }
        }
    }
    input.send(SessionInput::Shutdown)?;
    let _ = session_task.await;
    render_task.abort();
    Ok(())
}
