//! Turn state machine and session state object.
//!
//! [`TurnState`] drives the orchestrator's state machine; the allowed
//! transitions live in one table ([`TurnState::can_transition`]) so the
//! "never speaking and listening at once" invariant is checkable in a single
//! place instead of scattered guards.
//!
//! [`Session`] replaces the ambient globals of a typical event-handler
//! implementation: every flag, handle-adjacent value and counter the
//! callbacks coordinate through lives here, owned by the orchestrator and
//! mutated only inside its dispatch.
//!
//! [`SharedStatus`] is the read-only mirror for an embedding UI — cheap to
//! clone and safe to poll from another thread.

use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;

use crate::conversation::{ConversationLog, ConversationTurn};
use crate::language::LanguageTag;

// ---------------------------------------------------------------------------
// TurnState
// ---------------------------------------------------------------------------

/// Phases of the voice-turn loop.
///
/// ```text
/// Idle ──session start / re-arm──▶ Listening
/// Listening ──final transcript──▶ Processing
/// Processing ──reply handed to avatar──▶ Speaking
/// Speaking ──stop-speaking event──▶ Idle ──settling delay──▶ Listening
/// any state ──session end / disconnect──▶ Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// No recognition armed; waiting for a re-arm or session start.
    Idle,
    /// A recognition handle is armed and capturing.
    Listening,
    /// A final transcript is with the language model.
    Processing,
    /// The avatar is speaking (or about to); listening is suppressed.
    Speaking,
}

impl TurnState {
    /// Whether moving from `self` to `to` is an allowed transition.
    pub fn can_transition(self, to: TurnState) -> bool {
        if self == to {
            return true;
        }
        matches!(
            (self, to),
            // Teardown and drops to idle are always allowed.
            (_, TurnState::Idle)
                | (TurnState::Idle, TurnState::Listening)
                // Welcome message and other unsolicited speech.
                | (TurnState::Idle, TurnState::Speaking)
                | (TurnState::Listening, TurnState::Processing)
                // Listening is suppressed when the avatar starts talking.
                | (TurnState::Listening, TurnState::Speaking)
                | (TurnState::Processing, TurnState::Speaking)
        )
    }

    /// A short human-readable label suitable for a status display.
    pub fn label(&self) -> &'static str {
        match self {
            TurnState::Idle => "idle",
            TurnState::Listening => "listening",
            TurnState::Processing => "thinking",
            TurnState::Speaking => "speaking",
        }
    }
}

impl Default for TurnState {
    fn default() -> Self {
        TurnState::Idle
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// All mutable state of one kiosk session.
///
/// Owned exclusively by the orchestrator; every mutation happens inside its
/// dispatch, which is what makes the invariants enforceable.
pub struct Session {
    pub(crate) state: TurnState,
    /// The visitor-facing mute flag.  Cleared on non-recoverable recognition
    /// failures so the loop does not fight a dead microphone.
    pub(crate) mic_enabled: bool,
    /// True while avatar output audio is playing.
    pub(crate) avatar_speaking: bool,
    /// Recognition and synthesis language for the next turn.
    pub(crate) active_language: LanguageTag,
    /// Bumped at session start and end; timers carry the epoch they were
    /// scheduled under and go stale when it moves on.
    pub(crate) epoch: u64,
    pub(crate) started: bool,
    pub(crate) last_error: Option<String>,
    pub(crate) log: ConversationLog,
    pub(crate) watchdog: Option<JoinHandle<()>>,
}

impl Session {
    pub fn new(language: LanguageTag, max_turns: usize) -> Self {
        Self {
            state: TurnState::Idle,
            mic_enabled: false,
            avatar_speaking: false,
            active_language: language,
            epoch: 0,
            started: false,
            last_error: None,
            log: ConversationLog::new(max_turns),
            watchdog: None,
        }
    }

    /// Apply a state transition, enforcing the transition table and the
    /// speaking/listening exclusion.  Returns whether the transition was
    /// applied.
    pub fn set_state(&mut self, to: TurnState) -> bool {
        if self.state == to {
            return true;
        }
        if to == TurnState::Listening && self.avatar_speaking {
            log::warn!("session: refusing Listening while the avatar speaks");
            return false;
        }
        if !self.state.can_transition(to) {
            log::warn!(
                "session: illegal transition {:?} → {:?} refused",
                self.state,
                to
            );
            return false;
        }
        log::debug!("session: {:?} → {:?}", self.state, to);
        self.state = to;
        true
    }
}

// ---------------------------------------------------------------------------
// KioskStatus / SharedStatus
// ---------------------------------------------------------------------------

/// Read-only snapshot of the session, published after every dispatched
/// event.  This is what a UI renders: the state label, the active language,
/// the last few turns and any surfaced error.
#[derive(Debug, Clone)]
pub struct KioskStatus {
    pub state: TurnState,
    pub active_language: LanguageTag,
    pub mic_enabled: bool,
    pub avatar_speaking: bool,
    pub session_active: bool,
    pub last_error: Option<String>,
    /// The last few turns, chronological, for a transcript display.
    pub recent_turns: Vec<ConversationTurn>,
}

impl KioskStatus {
    pub fn new(language: LanguageTag) -> Self {
        Self {
            state: TurnState::Idle,
            active_language: language,
            mic_enabled: false,
            avatar_speaking: false,
            session_active: false,
            last_error: None,
            recent_turns: Vec::new(),
        }
    }
}

/// Thread-safe handle to [`KioskStatus`].
///
/// Cheap to clone (`Arc` clone).  Lock for a short critical section; do
/// **not** hold the lock across `.await` points.
pub type SharedStatus = Arc<Mutex<KioskStatus>>;

/// Construct a new [`SharedStatus`] for `language`.
pub fn new_shared_status(language: LanguageTag) -> SharedStatus {
    Arc::new(Mutex::new(KioskStatus::new(language)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
