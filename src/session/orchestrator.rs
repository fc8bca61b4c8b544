//! Turn orchestrator — drives the listen → think → speak loop.
//!
//! [`TurnOrchestrator`] owns the [`Session`] state object and responds to
//! [`SessionEvent`]s received over a single `tokio::sync::mpsc` channel.
//!
//! # Turn flow
//!
//! ```text
//! SessionCommand::Start
//!   └─▶ clear log, enable mic, speak welcome            [Speaking]
//!
//! AvatarEvent::Stopped
//!   └─▶ settling delay ─▶ arm recognition               [Listening]
//!
//! SpeechEvent::Transcript
//!   └─▶ stop channel, maybe switch language             [Processing]
//!         └─▶ completer.complete(...)  (the only suspension point)
//!               ├─ Ok  → hand reply to the avatar       [Speaking]
//!               └─ Err → speak localized fallback       [Speaking]
//! ```
//!
//! All four event sources (commands, recognition, avatar, timers) are
//! serialized through one dispatch function that runs each event to
//! completion, so the speaking/listening exclusion holds by construction.
//! Timers are epoch-stamped: a firing scheduled before a session ended is a
//! no-op, which makes teardown race-free.
//!
//! The liveness watchdog recovers recognition sessions that silently stop
//! emitting events without ever firing `Ended` — a known failure mode of
//! platform recognizers on long-running kiosks.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::avatar::{AvatarChannel, AvatarEvent};
use crate::config::KioskConfig;
use crate::conversation::ConversationTurn;
use crate::language::{LanguageDetector, LanguageTag};
use crate::llm::{ChatCompleter, CompletionRequest};
use crate::speech::{
    RawRecognitionEvent, RecognitionErrorKind, RecognitionProvider, SpeechChannel, SpeechError,
    SpeechEvent,
};

use super::events::{SessionCommand, SessionEvent, TimerEvent, TimerKind};
use super::state::{new_shared_status, Session, SharedStatus, TurnState};

/// Channel buffer sizes.
const EVENT_CHANNEL_SIZE: usize = 64;
const RECOGNITION_CHANNEL_SIZE: usize = 64;

// ---------------------------------------------------------------------------
// TurnOrchestrator
// ---------------------------------------------------------------------------

/// Ties the speech input channel and the avatar channel into one coherent
/// conversational loop.
///
/// Create with [`TurnOrchestrator::new`], hand out
/// [`sender`](Self::sender) / [`status`](Self::status) clones, then call
/// [`run`](Self::run) inside a tokio task.
pub struct TurnOrchestrator {
    config: KioskConfig,
    session: Session,
    speech: SpeechChannel,
    avatar: Arc<dyn AvatarChannel>,
    completer: Arc<dyn ChatCompleter>,
    status: SharedStatus,
    tx: mpsc::Sender<SessionEvent>,
    rx: mpsc::Receiver<SessionEvent>,
    raw_rx: Option<mpsc::Receiver<RawRecognitionEvent>>,
    avatar_rx: Option<mpsc::Receiver<AvatarEvent>>,
}

impl TurnOrchestrator {
    /// Create a new orchestrator.
    ///
    /// # Arguments
    ///
    /// * `config`    — timings, voices, languages, completion settings.
    /// * `provider`  — platform speech-recognition capability.
    /// * `avatar`    — avatar collaborator; its events must flow into the
    ///                 sender paired with `avatar_rx`.
    /// * `completer` — language-model collaborator.
    /// * `avatar_rx` — receiving end of the avatar's event channel.
    pub fn new(
        config: KioskConfig,
        provider: Arc<dyn RecognitionProvider>,
        avatar: Arc<dyn AvatarChannel>,
        completer: Arc<dyn ChatCompleter>,
        avatar_rx: mpsc::Receiver<AvatarEvent>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_SIZE);
        let (raw_tx, raw_rx) = mpsc::channel(RECOGNITION_CHANNEL_SIZE);

        let detector = LanguageDetector::new(config.default_language);
        let speech = SpeechChannel::new(provider, raw_tx, detector);
        let session = Session::new(config.default_language, config.conversation.max_turns);
        let status = new_shared_status(config.default_language);

        Self {
            config,
            session,
            speech,
            avatar,
            completer,
            status,
            tx,
            rx,
            raw_rx: Some(raw_rx),
            avatar_rx: Some(avatar_rx),
        }
    }

    /// Sender for [`SessionCommand`]s (wrapped in [`SessionEvent::Command`]).
    pub fn sender(&self) -> mpsc::Sender<SessionEvent> {
        self.tx.clone()
    }

    /// Read-only status mirror for an embedding UI.
    pub fn status(&self) -> SharedStatus {
        Arc::clone(&self.status)
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Run the orchestrator until [`SessionCommand::Shutdown`] arrives or the
    /// event channel closes.
    ///
    /// This is an `async fn` and should be spawned as a tokio task.
    pub async fn run(mut self) {
        // Bridge the collaborators' event streams into the session channel.
        // Each stream keeps its own ordering; the mpsc serializes the merge.
        if let Some(mut raw_rx) = self.raw_rx.take() {
            let tx = self.tx.clone();
            tokio::spawn(async move {
                while let Some(event) = raw_rx.recv().await {
                    if tx.send(SessionEvent::Recognition(event)).await.is_err() {
                        break;
                    }
                }
            });
        }
        if let Some(mut avatar_rx) = self.avatar_rx.take() {
            let tx = self.tx.clone();
            tokio::spawn(async move {
                while let Some(event) = avatar_rx.recv().await {
                    if tx.send(SessionEvent::Avatar(event)).await.is_err() {
                        break;
                    }
                }
            });
        }

        while let Some(event) = self.rx.recv().await {
            let shutdown = matches!(event, SessionEvent::Command(SessionCommand::Shutdown));
            self.dispatch(event).await;
            self.publish_status();
            if shutdown {
                break;
            }
        }

        log::info!("session: orchestrator shutting down");
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    /// Process one event to completion.  The completion call inside
    /// [`Self::on_transcript`] is the only suspension point; everything else
    /// is synchronous state manipulation.
    async fn dispatch(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Command(command) => self.on_command(command).await,
            SessionEvent::Recognition(raw) => {
                if let Some(speech_event) = self.speech.accept(raw) {
                    self.on_speech(speech_event).await;
                }
            }
            SessionEvent::Avatar(avatar_event) => self.on_avatar(avatar_event).await,
            SessionEvent::Timer(timer) => self.on_timer(timer),
        }
    }

    async fn on_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Start => self.start_session().await,
            SessionCommand::End => self.end_session().await,
            SessionCommand::Shutdown => self.end_session().await,
            SessionCommand::EnableMic => {
                if !self.session.started {
                    return;
                }
                self.session.mic_enabled = true;
                self.start_listening();
            }
            SessionCommand::DisableMic => {
                self.session.mic_enabled = false;
                self.speech.stop();
                if self.session.state == TurnState::Listening {
                    self.session.set_state(TurnState::Idle);
                }
            }
        }
    }

    async fn on_speech(&mut self, event: SpeechEvent) {
        match event {
            SpeechEvent::Started => {
                log::debug!("session: recognition capture started");
            }
            SpeechEvent::Transcript { text, language } => {
                self.on_transcript(text, language).await;
            }
            SpeechEvent::Ended => {
                // The channel never restarts itself; re-arming is policy and
                // happens here, after a short delay.
                if self.session.state == TurnState::Listening
                    && self.session.mic_enabled
                    && !self.session.avatar_speaking
                {
                    self.schedule(TimerKind::Restart, self.config.timing.restart_delay());
                }
            }
            SpeechEvent::Error(kind) => self.on_recognition_error(kind),
        }
    }

    async fn on_avatar(&mut self, event: AvatarEvent) {
        match event {
            AvatarEvent::Started => {
                if !self.session.started {
                    return;
                }
                self.session.avatar_speaking = true;
                // Listening is suppressed the moment output audio starts.
                self.speech.stop();
                if matches!(self.session.state, TurnState::Idle | TurnState::Listening) {
                    self.session.set_state(TurnState::Speaking);
                }
            }
            AvatarEvent::Stopped => {
                if !self.session.started {
                    return;
                }
                self.session.avatar_speaking = false;
                if self.session.state == TurnState::Speaking {
                    self.session.set_state(TurnState::Idle);
                }
                // Wait out the trailing audio before re-arming the mic.
                self.schedule(TimerKind::Settle, self.config.timing.settling_delay());
            }
            AvatarEvent::Disconnected => {
                log::warn!("session: avatar stream disconnected, ending session");
                self.end_session().await;
            }
        }
    }

    fn on_timer(&mut self, timer: TimerEvent) {
        if timer.epoch != self.session.epoch {
            log::trace!("session: dropping stale timer {:?}", timer.kind);
            return;
        }
        match timer.kind {
            TimerKind::Settle | TimerKind::RetryBackoff | TimerKind::Restart => {
                self.start_listening();
            }
            TimerKind::WatchdogTick => self.watchdog_check(),
        }
    }

    // -----------------------------------------------------------------------
    // Session lifecycle
    // -----------------------------------------------------------------------

    async fn start_session(&mut self) {
        if self.session.started {
            return;
        }
        log::info!("session: starting");

        self.session.epoch += 1;
        self.session.started = true;
        self.session.last_error = None;
        self.session.log.clear();
        self.session.mic_enabled = true;
        self.spawn_watchdog();

        // Pre-mark speaking before the welcome request so a racing re-arm
        // cannot open the mic under the avatar's first words.
        self.session.avatar_speaking = true;
        self.session.set_state(TurnState::Speaking);

        let greeting = self.session.active_language.greeting();
        let voice = self
            .config
            .voices
            .voice_for(self.session.active_language)
            .to_string();
        if let Err(e) = self.avatar.speak(greeting, &voice).await {
            log::warn!("session: welcome message failed: {e}");
            self.session.avatar_speaking = false;
            self.session.set_state(TurnState::Idle);
            // Arm the mic anyway; the visitor should not face a dead kiosk.
            self.schedule(TimerKind::Restart, self.config.timing.retry_backoff());
        }
    }

    async fn end_session(&mut self) {
        if !self.session.started {
            return;
        }
        log::info!("session: ending");

        // Invalidate every pending timer before touching anything else.
        self.session.epoch += 1;
        if let Some(watchdog) = self.session.watchdog.take() {
            watchdog.abort();
        }

        self.speech.stop();
        if let Err(e) = self.avatar.stop().await {
            log::warn!("session: avatar teardown failed: {e}");
        }

        self.session.log.clear();
        self.session.mic_enabled = false;
        self.session.avatar_speaking = false;
        self.session.set_state(TurnState::Idle);
        self.session.started = false;
    }

    // -----------------------------------------------------------------------
    // Listening
    // -----------------------------------------------------------------------

    /// Arm recognition in the active language, if the session allows it.
    ///
    /// This is the single entry point for every (re-)arm path: session
    /// start, settling delay, error back-off, ended-handle restart and
    /// watchdog recovery all funnel through the same guards.
    fn start_listening(&mut self) {
        if !self.session.started || !self.session.mic_enabled || self.session.avatar_speaking {
            log::debug!(
                "session: not arming listening (started={}, mic={}, speaking={})",
                self.session.started,
                self.session.mic_enabled,
                self.session.avatar_speaking
            );
            return;
        }
        if !matches!(self.session.state, TurnState::Idle | TurnState::Listening) {
            return;
        }
        if self.session.state == TurnState::Listening && self.speech.is_active() {
            // Already armed — overlapping re-arm timers are harmless.
            return;
        }

        match self.speech.start(self.session.active_language) {
            Ok(()) => {
                self.session.set_state(TurnState::Listening);
            }
            Err(SpeechError::Unavailable) => {
                self.fail_listening("speech recognition is not available on this platform");
            }
            Err(e) => {
                log::warn!("session: recognition start failed: {e}");
                self.schedule(TimerKind::RetryBackoff, self.config.timing.retry_backoff());
            }
        }
    }

    /// Non-recoverable listening failure: surface once, drop to idle and
    /// stop fighting the microphone until the user re-enables it.
    fn fail_listening(&mut self, message: &str) {
        log::error!("session: {message}");
        self.session.last_error = Some(message.to_string());
        self.session.mic_enabled = false;
        self.speech.stop();
        self.session.set_state(TurnState::Idle);
    }

    fn on_recognition_error(&mut self, kind: RecognitionErrorKind) {
        if kind.is_retryable() {
            log::warn!("session: retryable recognition error: {kind:?}");
            self.speech.stop();
            if self.session.state == TurnState::Listening {
                self.schedule(TimerKind::RetryBackoff, self.config.timing.retry_backoff());
            }
            return;
        }

        match kind {
            RecognitionErrorKind::NoSpeech => {
                // Silence timeout.  Liveness was stamped by the channel; the
                // recognizer will fire Ended and the normal restart path
                // re-arms.
                log::debug!("session: no speech detected");
            }
            RecognitionErrorKind::Aborted => {
                // Our own stop() calls surface as aborts; nothing to do.
                log::debug!("session: recognition aborted");
            }
            RecognitionErrorKind::PermissionDenied => {
                self.fail_listening("microphone permission denied");
            }
            other => {
                // Retryable kinds were handled above.
                log::debug!("session: recognition error {other:?} ignored");
            }
        }
    }

    // -----------------------------------------------------------------------
    // Turn processing
    // -----------------------------------------------------------------------

    async fn on_transcript(&mut self, text: String, language: LanguageTag) {
        if self.session.avatar_speaking {
            // Belt over the channel's own stale-handle filtering: results
            // must never be accepted while output audio plays.
            log::debug!("session: ignoring transcript while the avatar speaks");
            return;
        }
        if self.session.state != TurnState::Listening {
            log::debug!(
                "session: ignoring transcript in state {:?}",
                self.session.state
            );
            return;
        }

        // One recognition at a time: the handle is released before the turn
        // is processed.
        self.speech.stop();
        self.session.set_state(TurnState::Processing);

        // Switching the active language first makes the reply use the right
        // synthesis voice and the next listening phase the right locale.
        if language != self.session.active_language {
            log::info!(
                "session: language switched {} → {}",
                self.session.active_language,
                language
            );
            self.session.active_language = language;
        }

        let context = self
            .session
            .log
            .recent_window(self.config.conversation.context_turns);
        self.session
            .log
            .append(ConversationTurn::user(text.clone(), language));

        let request = CompletionRequest {
            message: &text,
            language,
            context: &context,
        };

        let reply = match self.completer.complete(request).await {
            Ok(reply) => reply,
            Err(e) => {
                log::error!("session: completion failed: {e}");
                self.session.active_language.fallback_reply().to_string()
            }
        };

        self.session
            .log
            .append(ConversationTurn::assistant(reply.clone(), self.session.active_language));
        self.speak_reply(&reply).await;
    }

    /// Hand a reply to the avatar.  This is the `Processing → Speaking`
    /// edge; the avatar's `Started` event only confirms audio.
    async fn speak_reply(&mut self, text: &str) {
        self.session.set_state(TurnState::Speaking);

        let voice = self
            .config
            .voices
            .voice_for(self.session.active_language)
            .to_string();
        if let Err(e) = self.avatar.speak(text, &voice).await {
            log::error!("session: avatar speak failed: {e}");
            self.session.avatar_speaking = false;
            self.session.set_state(TurnState::Idle);
            self.schedule(TimerKind::Restart, self.config.timing.restart_delay());
        }
    }

    // -----------------------------------------------------------------------
    // Watchdog
    // -----------------------------------------------------------------------

    fn spawn_watchdog(&mut self) {
        if let Some(old) = self.session.watchdog.take() {
            old.abort();
        }

        let tx = self.tx.clone();
        let epoch = self.session.epoch;
        let interval = self.config.timing.watchdog_interval();

        self.session.watchdog = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // the immediate first tick
            loop {
                ticker.tick().await;
                let tick = SessionEvent::Timer(TimerEvent {
                    epoch,
                    kind: TimerKind::WatchdogTick,
                });
                if tx.send(tick).await.is_err() {
                    break;
                }
            }
        }));
    }

    /// Compare now against the liveness clock and force a handle restart
    /// when recognition has been silent past the staleness threshold.
    fn watchdog_check(&mut self) {
        if !self.session.mic_enabled || self.session.avatar_speaking {
            return;
        }
        if !matches!(self.session.state, TurnState::Idle | TurnState::Listening) {
            return;
        }

        let idle_for = self.speech.last_activity().elapsed();
        if idle_for > self.config.timing.staleness_threshold() {
            log::warn!(
                "session: no recognition activity for {idle_for:?}, forcing restart"
            );
            self.speech.stop();
            self.schedule(TimerKind::Restart, self.config.timing.restart_delay());
        } else {
            log::debug!("session: liveness ok ({idle_for:?} since last event)");
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Schedule a one-shot timer stamped with the current epoch.
    fn schedule(&self, kind: TimerKind, delay: Duration) {
        let tx = self.tx.clone();
        let epoch = self.session.epoch;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(SessionEvent::Timer(TimerEvent { epoch, kind })).await;
        });
    }

    fn publish_status(&self) {
        let mut status = self.status.lock().unwrap();
        status.state = self.session.state;
        status.active_language = self.session.active_language;
        status.mic_enabled = self.session.mic_enabled;
        status.avatar_speaking = self.session.avatar_speaking;
        status.session_active = self.session.started;
        status.last_error = self.session.last_error.clone();
        status.recent_turns = self.session.log.recent_window(3);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
