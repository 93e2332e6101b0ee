//! The conversational session controller.
//!
//! Reconciles three independently timed sources — continuous speech
//! recognition, incremental response streaming and typed input — into one
//! ordered conversation log, with mid-stream cancellation and a single
//! in-flight response at a time.

mod compose;
mod message;
mod session;

pub use compose::CompositionBuffer;
pub use message::{ConversationLog, Message, Role};
pub use session::{
    ChatOutcome, ChatSignal, Phase, Session, SessionEvent, SessionInput,
    CAPTURE_UNSUPPORTED_TEXT, CONNECTION_ERROR_TEXT, GREETING, MODELS,
};
