//! Application entry point — terminal demo of the voice kiosk.
//!
//! The production deployment pairs the orchestrator with a browser speech
//! recognizer and a streaming-avatar player.  This binary substitutes both
//! with terminal collaborators so the full turn loop can be exercised from a
//! shell: typed lines stand in for final transcripts and the avatar "speaks"
//! by printing, with simulated start/stop-speaking events.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`KioskConfig`] from disk (returns default on first run).
//! 3. Create the tokio runtime (multi-thread, 2 workers).
//! 4. Build the completer ([`ApiCompleter`] when configured, an offline echo
//!    stub otherwise).
//! 5. Wire the terminal recognition provider and console avatar.
//! 6. Spawn the [`TurnOrchestrator`] and a status printer.
//! 7. Start the session; Ctrl-C shuts down.

use std::io::BufRead;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use voice_kiosk::{
    avatar::{AvatarChannel, AvatarError, AvatarEvent, AvatarSink},
    config::KioskConfig,
    llm::{ApiCompleter, ChatCompleter, CompletionError, CompletionRequest},
    session::{SessionCommand, SessionEvent, TurnOrchestrator, TurnState},
    speech::{
        RawEventKind, RawRecognitionEvent, RecognitionHandle, RecognitionProvider,
        RecognitionSink, SpeechError,
    },
};

fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("voice-kiosk starting up");

    // 2. Configuration
    let config = KioskConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        KioskConfig::default()
    });

    // 3. Tokio runtime
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?;

    rt.block_on(run(config))
}

async fn run(config: KioskConfig) -> anyhow::Result<()> {
    // 4. Completer — real API when configured, offline echo otherwise.
    let completer: Arc<dyn ChatCompleter> = if config.llm.enabled {
        log::info!("using completion endpoint {}", config.llm.base_url);
        Arc::new(ApiCompleter::from_config(&config.llm))
    } else {
        log::warn!("llm.enabled = false — replies are offline echoes");
        Arc::new(EchoCompleter)
    };

    // 5. Terminal collaborators.
    let (avatar_tx, avatar_rx) = mpsc::channel::<AvatarEvent>(16);
    let avatar = Arc::new(ConsoleAvatar::new(avatar_tx));

    let (line_tx, line_rx) = mpsc::channel::<String>(16);
    let provider = Arc::new(TerminalRecognitionProvider::new(line_rx));

    // Blocking stdin reader thread; each line becomes one "utterance".
    std::thread::Builder::new()
        .name("stdin-reader".into())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }
                if line_tx.blocking_send(line).is_err() {
                    break;
                }
            }
        })?;

    // 6. Orchestrator + status printer.
    let orchestrator = TurnOrchestrator::new(
        config,
        provider as Arc<dyn RecognitionProvider>,
        Arc::clone(&avatar) as Arc<dyn AvatarChannel>,
        completer,
        avatar_rx,
    );
    let commands = orchestrator.sender();
    let status = orchestrator.status();
    let runner = tokio::spawn(orchestrator.run());

    tokio::spawn(async move {
        let mut last = TurnState::Idle;
        loop {
            tokio::time::sleep(Duration::from_millis(200)).await;
            let snapshot = status.lock().unwrap().clone();
            if snapshot.state != last {
                println!("· {} [{}]", snapshot.state.label(), snapshot.active_language);
                last = snapshot.state;
            }
            if let Some(error) = snapshot.last_error {
                log::error!("{error}");
            }
        }
    });

    // 7. Run until Ctrl-C.
    println!("Type a line to talk to the kiosk. Ctrl-C to exit.");
    commands
        .send(SessionEvent::Command(SessionCommand::Start))
        .await?;

    tokio::signal::ctrl_c().await?;
    log::info!("shutting down");
    commands
        .send(SessionEvent::Command(SessionCommand::Shutdown))
        .await?;
    runner.await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// TerminalRecognitionProvider — typed lines as final transcripts
// ---------------------------------------------------------------------------

/// Recognition "capability" backed by stdin.  Each started handle drains the
/// shared line source and emits every line as a final result until stopped.
struct TerminalRecognitionProvider {
    lines: Arc<Mutex<mpsc::Receiver<String>>>,
}

impl TerminalRecognitionProvider {
    fn new(lines: mpsc::Receiver<String>) -> Self {
        Self {
            lines: Arc::new(Mutex::new(lines)),
        }
    }
}

impl RecognitionProvider for TerminalRecognitionProvider {
    fn is_available(&self) -> bool {
        true
    }

    fn start(
        &self,
        locale: &str,
        generation: u64,
        sink: RecognitionSink,
    ) -> Result<Box<dyn RecognitionHandle>, SpeechError> {
        log::debug!("terminal recognizer armed ({locale})");
        let lines = Arc::clone(&self.lines);

        let task = tokio::spawn(async move {
            let send = |kind: RawEventKind| {
                let sink = sink.clone();
                async move {
                    sink.send(RawRecognitionEvent { generation, kind }).await
                }
            };

            if send(RawEventKind::Started).await.is_err() {
                return;
            }
            loop {
                let line = { lines.lock().await.recv().await };
                let Some(line) = line else {
                    let _ = send(RawEventKind::Ended).await;
                    return;
                };
                if send(RawEventKind::Final(line)).await.is_err() {
                    return;
                }
            }
        });

        Ok(Box::new(TerminalHandle { task }))
    }
}

struct TerminalHandle {
    task: tokio::task::JoinHandle<()>,
}

impl RecognitionHandle for TerminalHandle {
    fn stop(&mut self) {
        self.task.abort();
    }
}

impl Drop for TerminalHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// ---------------------------------------------------------------------------
// ConsoleAvatar — prints replies, simulates speaking duration
// ---------------------------------------------------------------------------

/// Avatar stand-in: prints the reply and emits `Started`/`Stopped` with a
/// playback duration proportional to the text length.
struct ConsoleAvatar {
    events: AvatarSink,
}

impl ConsoleAvatar {
    fn new(events: AvatarSink) -> Self {
        Self { events }
    }
}

#[async_trait]
impl AvatarChannel for ConsoleAvatar {
    async fn speak(&self, text: &str, voice_id: &str) -> Result<(), AvatarError> {
        println!("🗣  ({voice_id}) {text}");

        // Rough speaking-rate simulation, capped so long replies do not
        // stall the demo.
        let duration = Duration::from_millis((300 + 30 * text.chars().count() as u64).min(4000));
        let events = self.events.clone();
        tokio::spawn(async move {
            let _ = events.send(AvatarEvent::Started).await;
            tokio::time::sleep(duration).await;
            let _ = events.send(AvatarEvent::Stopped).await;
        });
        Ok(())
    }

    async fn stop(&self) -> Result<(), AvatarError> {
        log::debug!("console avatar stopped");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// EchoCompleter — offline stand-in when no endpoint is configured
// ---------------------------------------------------------------------------

/// Fallback completer so the demo still converses without an API key.
struct EchoCompleter;

#[async_trait]
impl ChatCompleter for EchoCompleter {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, CompletionError> {
        use voice_kiosk::language::LanguageTag;
        let reply = match request.language {
            LanguageTag::Ru => format!("Вы сказали: «{}»", request.message),
            _ => format!("You said: \"{}\"", request.message),
        };
        Ok(reply)
    }
}
