use std::io::Write;
use std::sync::{Arc, Mutex};

use session::{CompositionBuffer, ConversationLog, Role, SessionEvent};
use tokio::sync::broadcast;

/// Print session updates to the terminal until the event channel closes.
pub async fn render(
    mut events: broadcast::Receiver<SessionEvent>,
    log: Arc<Mutex<ConversationLog>>,
    buffer: Arc<Mutex<CompositionBuffer>>,
) {
    while let Ok(event) = events.recv().await {
        match event {
            SessionEvent::LogChanged => print_last(&log),
            SessionEvent::CompositionChanged => print_composition(&buffer),
            SessionEvent::CaptureChanged(on) => {
                println!(
                    "{}",
                    if on {
                        "الميكروفون يعمل"
                    } else {
                        "الميكروفون متوقف"
                    }
                );
            }
            SessionEvent::Notice(text) => println!("! {text}"),
            SessionEvent::PhaseChanged(_) => {}
        }
    }
}

fn print_last(log: &Arc<Mutex<ConversationLog>>) {
    let log = log.lock().unwrap();
    let Some(message) = log.all().last() else {
        return;
    };
    match message.role {
        // The provisional entry redraws in place as deltas arrive.
        Role::AssistantProvisional => {
            print!("\r\x1b[K… {}", message.content);
            let _ = std::io::stdout().flush();
        }
        Role::Assistant => println!("\r\x1b[Kالمساعد: {}", message.content),
        Role::User => println!("أنت: {}", message.content),
        Role::System => println!("المساعد: {}", message.content),
    }
}

fn print_composition(buffer: &Arc<Mutex<CompositionBuffer>>) {
    let buffer = buffer.lock().unwrap();
    if buffer.committed().is_empty() && buffer.interim().is_empty() {
        return;
    }
    print!("\r\x1b[K✎ {} {}", buffer.committed(), buffer.interim());
    let _ = std::io::stdout().flush();
}
