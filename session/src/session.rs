use std::sync::{Arc, Mutex};

use chat::{ChatClient, ChatEvent};
use speech::{CaptureAdapter, CaptureError, CaptureEvent, Synthesizer};
use tokio::sync::{broadcast, mpsc};
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

use crate::{CompositionBuffer, ConversationLog, Role};

/// Greeting seeded as the first log entry.
pub const GREETING: &str = "أهلاً! كيف أستطيع مساعدتك؟";
/// Fixed text of the assistant message appended when a request fails.
pub const CONNECTION_ERROR_TEXT: &str = "حدث خطأ في الاتصال";
/// Notice surfaced when the platform cannot capture speech.
pub const CAPTURE_UNSUPPORTED_TEXT: &str = "التعرف على الصوت غير متاح";
/// Models the backend is known to serve.
pub const MODELS: &[&str] = &["llama3.1", "qwen2.5", "gemma2", "aya"];

/// Whether a response is currently streaming in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Streaming,
}

/// A signal from an in-flight streaming request, tagged with the request's
/// identity so late arrivals from a cancelled request can be dropped.
#[derive(Clone, Debug)]
pub struct ChatSignal {
    pub request: u64,
    pub outcome: ChatOutcome,
}

#[derive(Clone, Debug)]
pub enum ChatOutcome {
    /// Full accumulated response text so far.
    Delta(String),
    /// Terminal: the stream completed with this final text.
    Done(String),
    /// Terminal: the request or stream failed.
    Failed,
}

/// Inputs consumed by the session loop.
#[derive(Clone, Debug)]
pub enum SessionInput {
    /// Typed entry, replacing the committed composition text.
    SetText(String),
    Submit,
    Cancel,
    ToggleCapture,
    SetModel(String),
    /// Finalized speech chunk from the capture adapter.
    TranscriptChunk(String),
    /// Interim speech preview from the capture adapter.
    TranscriptPreview(String),
    /// Internal: forwarded from the streaming request task.
    Chat(ChatSignal),
    Shutdown,
}

/// Notifications for front-ends observing the session.
#[derive(Clone, Debug)]
pub enum SessionEvent {
    LogChanged,
    CompositionChanged,
    PhaseChanged(Phase),
    CaptureChanged(bool),
    Notice(String),
}

struct ActiveRequest {
    id: u64,
    task: tokio::task::JoinHandle<()>,
}

/// The conversational session controller.
///
/// Owns the ordered message log and the composition buffer, merges speech
/// capture, streaming responses and typed input into log mutations, and
/// enforces a single in-flight response. All mutations happen on the task
/// driving [`Session::run`]; the shared log and buffer handles exist for
/// read-side observers.
pub struct Session {
    chat: Arc<dyn ChatClient>,
    synth: Arc<dyn Synthesizer>,
    capture: CaptureAdapter,
    capture_rx: Option<mpsc::UnboundedReceiver<CaptureEvent>>,
    log: Arc<Mutex<ConversationLog>>,
    buffer: Arc<Mutex<CompositionBuffer>>,
    model: String,
    models: Vec<String>,
    capture_on: bool,
    active: Option<ActiveRequest>,
    next_request: u64,
    events_tx: broadcast::Sender<SessionEvent>,
    input_tx: mpsc::UnboundedSender<SessionInput>,
    input_rx: mpsc::UnboundedReceiver<SessionInput>,
}

impl Session {
    pub fn new(
        chat: Arc<dyn ChatClient>,
        synth: Arc<dyn Synthesizer>,
        capture: CaptureAdapter,
        capture_rx: mpsc::UnboundedReceiver<CaptureEvent>,
    ) -> Self {
        let (events_tx, _) = broadcast::channel(32);
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let mut log = ConversationLog::new();
        log.push(Role::System, GREETING);
        Self {
            chat,
            synth,
            capture,
            capture_rx: Some(capture_rx),
            log: Arc::new(Mutex::new(log)),
            buffer: Arc::new(Mutex::new(CompositionBuffer::new())),
            model: MODELS[0].to_string(),
            models: MODELS.iter().map(|m| m.to_string()).collect(),
            capture_on: false,
            active: None,
            next_request: 0,
            events_tx,
            input_tx,
            input_rx,
        }
    }

    /// Create a new receiver for [`SessionEvent`]s.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events_tx.subscribe()
    }

    /// Obtain a sender for queueing [`SessionInput`]s to the session loop.
    pub fn input_sender(&self) -> mpsc::UnboundedSender<SessionInput> {
        self.input_tx.clone()
    }

    /// Get a handle to the shared conversation log.
    pub fn log_handle(&self) -> Arc<Mutex<ConversationLog>> {
        self.log.clone()
    }

    /// Get a handle to the shared composition buffer.
    pub fn composition(&self) -> Arc<Mutex<CompositionBuffer>> {
        self.buffer.clone()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn phase(&self) -> Phase {
        if self.active.is_some() {
            Phase::Streaming
        } else {
            Phase::Idle
        }
    }

    pub fn capture_on(&self) -> bool {
        self.capture_on
    }

    /// Drive the session until a `Shutdown` input arrives. Returns the
    /// session so callers can inspect its final state.
    pub async fn run(mut self) -> Self {
        info!("session started");
        if let Some(mut capture_rx) = self.capture_rx.take() {
            let forward = self.input_tx.clone();
            tokio::spawn(async move {
                while let Some(event) = capture_rx.recv().await {
                    let input = match event {
                        CaptureEvent::Chunk(text) => SessionInput::TranscriptChunk(text),
                        CaptureEvent::Preview(text) => SessionInput::TranscriptPreview(text),
                    };
                    if forward.send(input).is_err() {
                        break;
                    }
                }
            });
        }
        while let Some(input) = self.input_rx.recv().await {
            if !self.handle(input).await {
                break;
            }
        }
        info!("session ended");
        self
    }

    async fn handle(&mut self, input: SessionInput) -> bool {
        match input {
            SessionInput::SetText(text) => {
                self.buffer.lock().unwrap().set_text(text);
                self.emit(SessionEvent::CompositionChanged);
            }
            SessionInput::Submit => self.submit(),
            SessionInput::Cancel => self.cancel(),
            SessionInput::ToggleCapture => self.toggle_capture(),
            SessionInput::SetModel(model) => self.set_model(model),
            SessionInput::TranscriptChunk(text) => {
                self.buffer.lock().unwrap().push_chunk(&text);
                self.emit(SessionEvent::CompositionChanged);
            }
            SessionInput::TranscriptPreview(text) => {
                self.buffer.lock().unwrap().set_interim(text);
                self.emit(SessionEvent::CompositionChanged);
            }
            SessionInput::Chat(signal) => self.on_chat(signal).await,
            SessionInput::Shutdown => return false,
        }
        true
    }

    /// `Idle` + non-blank committed text: append the user message and start
    /// the streaming request. Anything else is a no-op.
    fn submit(&mut self) {
        if self.active.is_some() {
            debug!("submit ignored while a response is streaming");
            return;
        }
        let text = {
            let mut buffer = self.buffer.lock().unwrap();
            if buffer.is_blank() {
                return;
            }
            buffer.take()
        };
        let history = {
            let mut log = self.log.lock().unwrap();
            log.push(Role::User, text);
            log.history()
        };
        self.emit(SessionEvent::LogChanged);
        self.emit(SessionEvent::CompositionChanged);

        self.next_request += 1;
        let id = self.next_request;
        let chat = self.chat.clone();
        let model = self.model.clone();
        let forward = self.input_tx.clone();
        let task = tokio::spawn(async move {
            let signal = |outcome| SessionInput::Chat(ChatSignal { request: id, outcome });
            match chat.stream_chat(&model, &history).await {
                Ok(mut stream) => {
                    while let Some(event) = stream.next().await {
                        let outcome = match event {
                            Ok(ChatEvent::Partial(text)) => ChatOutcome::Delta(text),
                            Ok(ChatEvent::Done(text)) => ChatOutcome::Done(text),
                            Err(e) => {
                                warn!(%e, "chat stream failed");
                                ChatOutcome::Failed
                            }
                        };
                        let terminal =
                            matches!(outcome, ChatOutcome::Done(_) | ChatOutcome::Failed);
                        if forward.send(signal(outcome)).is_err() || terminal {
                            break;
                        }
                    }
                }
                Err(e) => {
                    warn!(%e, "chat request failed");
                    let _ = forward.send(signal(ChatOutcome::Failed));
                }
            }
        });
        self.active = Some(ActiveRequest { id, task });
        self.emit(SessionEvent::PhaseChanged(Phase::Streaming));
    }

    /// Abort the active request and discard the provisional entry. No
    /// message records the cancellation.
    fn cancel(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        debug!(request = active.id, "cancelling streaming response");
        active.task.abort();
        self.log.lock().unwrap().clear_provisional();
        self.emit(SessionEvent::LogChanged);
        self.emit(SessionEvent::PhaseChanged(Phase::Idle));
    }

    async fn on_chat(&mut self, signal: ChatSignal) {
        let active_id = match &self.active {
            Some(active) => active.id,
            None => {
                debug!(request = signal.request, "dropping signal with no active request");
                return;
            }
        };
        if signal.request != active_id {
            debug!(
                request = signal.request,
                active = active_id,
                "dropping stale chat signal"
            );
            return;
        }
        match signal.outcome {
            ChatOutcome::Delta(text) => {
                self.log.lock().unwrap().set_provisional(text);
                self.emit(SessionEvent::LogChanged);
            }
            ChatOutcome::Done(text) => {
                self.log.lock().unwrap().finalize_assistant(text.clone());
                self.active = None;
                self.emit(SessionEvent::LogChanged);
                self.emit(SessionEvent::PhaseChanged(Phase::Idle));
                self.synth.speak(&text).await;
            }
            ChatOutcome::Failed => {
                self.log.lock().unwrap().finalize_assistant(CONNECTION_ERROR_TEXT);
                self.active = None;
                self.emit(SessionEvent::LogChanged);
                self.emit(SessionEvent::PhaseChanged(Phase::Idle));
            }
        }
    }

    fn toggle_capture(&mut self) {
        if self.capture_on {
            self.capture.stop();
            self.capture_on = false;
            self.emit(SessionEvent::CaptureChanged(false));
        } else {
            match self.capture.start() {
                Ok(()) => {
                    self.buffer.lock().unwrap().set_interim("");
                    self.capture_on = true;
                    self.emit(SessionEvent::CompositionChanged);
                    self.emit(SessionEvent::CaptureChanged(true));
                }
                Err(CaptureError::Unsupported) => {
                    self.emit(SessionEvent::Notice(CAPTURE_UNSUPPORTED_TEXT.to_string()));
                }
                Err(e) => {
                    warn!(%e, "capture start failed");
                    self.emit(SessionEvent::Notice(e.to_string()));
                }
            }
        }
    }

    fn set_model(&mut self, model: String) {
        if self.models.iter().any(|m| m == &model) {
            debug!(%model, "model switched");
            self.model = model;
        } else {
            warn!(%model, "unknown model requested");
            self.emit(SessionEvent::Notice(format!("نموذج غير معروف: {model}")));
        }
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events_tx.send(event);
    }
}
