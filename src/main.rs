use mozhi::oneshot::{self, FileTranscriber};
use mozhi::session::event::SessionEvent;
use mozhi::{ClientConfig, SessionManager};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Setup logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    // 2. Config + services
    let config = ClientConfig::from_env()?;
    let transcriber = FileTranscriber::new(&config);
    let (mut manager, mut event_rx) = SessionManager::new(config);

    println!("mozhi: live Malayalam voice translator");
    println!("commands: r = record/stop, f <path> = translate an audio file, h = history, q = quit");

    let stdin = tokio::io::stdin();
    let reader = BufReader::new(stdin);
    let mut lines = reader.lines();

    // 3. Driving loop. Session events and user commands both land here,
    // so every state mutation happens on this one task.
    loop {
        tokio::select! {
            ev = event_rx.recv() => {
                let Some(ev) = ev else { break };
                let kind = ev.event.clone();
                let committed_before = manager.history().len();
                manager.handle_event(ev);
                render_event(&manager, &kind, committed_before);
            }
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(l)) => l,
                    _ => break,
                };
                let line = line.trim();
                match line.split_whitespace().next() {
                    Some("r") => toggle_recording(&mut manager).await,
                    Some("f") => {
                        let path = line[1..].trim();
                        if path.is_empty() {
                            println!("usage: f <path-to-audio-file>");
                        } else {
                            run_file(&mut manager, &transcriber, path).await;
                        }
                    }
                    Some("h") => render_history(&manager),
                    Some("q") => break,
                    Some(other) => println!("unknown command: {other}"),
                    None => {}
                }
            }
        }
    }

    manager.stop();
    Ok(())
}

async fn toggle_recording(manager: &mut SessionManager) {
    if manager.is_active() {
        manager.stop();
        println!("stopped.");
        return;
    }
    println!("connecting...");
    match manager.start().await {
        Ok(()) => {}
        Err(e) => eprintln!("error: {e}"),
    }
}

async fn run_file(manager: &mut SessionManager, transcriber: &FileTranscriber, path: &str) {
    let path = Path::new(path);
    let bytes = match tokio::fs::read(path).await {
        Ok(b) => b,
        Err(e) => {
            eprintln!("error: could not read {}: {e}", path.display());
            return;
        }
    };
    let mime = oneshot::mime_for_path(path);
    println!("translating {} ({} bytes)...", path.display(), bytes.len());
    match manager.transcribe_file(transcriber, &bytes, mime).await {
        Ok(()) => {
            let view = manager.view();
            println!("[you]      {}", view.current_input);
            println!("[മലയാളം]  {}", view.current_output);
        }
        Err(e) => eprintln!("error: {e}"),
    }
}

fn render_event(manager: &SessionManager, event: &SessionEvent, committed_before: usize) {
    let view = manager.view();
    match event {
        SessionEvent::Open => println!("recording. speak now; 'r' to stop."),
        SessionEvent::InputDelta(_) => println!("[you]      {}", view.current_input),
        SessionEvent::OutputDelta(_) => println!("[മലയാളം]  {}", view.current_output),
        SessionEvent::TurnComplete => {
            if manager.history().len() > committed_before {
                if let Some(record) = manager.history().last() {
                    println!("── {} → {}", record.user.trim(), record.translation.trim());
                }
            }
        }
        SessionEvent::Error(_) => {
            if let Some(message) = &view.error {
                eprintln!("error: {message}");
            }
        }
        SessionEvent::Closed => {}
    }
}

fn render_history(manager: &SessionManager) {
    let history = manager.history();
    if history.is_empty() {
        println!("history is empty.");
        return;
    }
    // Newest first
    for record in history.iter().rev() {
        println!("[you]      {}", record.user.trim());
        println!("[മലയാളം]  {}", record.translation.trim());
        println!();
    }
}
