//! Event vocabulary of the session loop.
//!
//! Everything the orchestrator reacts to — control commands, raw recognition
//! events, avatar speaking-state events and timer firings — arrives as one
//! [`SessionEvent`] stream over a single mpsc channel, so effects from the
//! independent sources are serialized into one coherent turn order.

use crate::avatar::AvatarEvent;
use crate::speech::RawRecognitionEvent;

// ---------------------------------------------------------------------------
// SessionCommand
// ---------------------------------------------------------------------------

/// Control commands sent by the embedding application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    /// Begin a session: clear the log, enable the mic, speak the welcome.
    Start,
    /// End the session and release every handle and timer.
    End,
    /// Re-enable the microphone after a `DisableMic`.
    EnableMic,
    /// Mute the kiosk: stop recognition, keep the session alive.
    DisableMic,
    /// End the session and exit the event loop.
    Shutdown,
}

// ---------------------------------------------------------------------------
// Timers
// ---------------------------------------------------------------------------

/// What a fired timer asks the orchestrator to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Settling delay after the avatar stopped speaking elapsed.
    Settle,
    /// Back-off after a retryable recognition error elapsed.
    RetryBackoff,
    /// Delay before restarting an ended or force-stopped handle elapsed.
    Restart,
    /// Periodic liveness check.
    WatchdogTick,
}

/// A timer firing, stamped with the session epoch at scheduling time.
///
/// A firing whose epoch no longer matches the session's is stale — the
/// session was torn down (or restarted) in between — and must be a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerEvent {
    pub epoch: u64,
    pub kind: TimerKind,
}

// ---------------------------------------------------------------------------
// SessionEvent
// ---------------------------------------------------------------------------

/// Any input the session loop dispatches on.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Command(SessionCommand),
    Recognition(RawRecognitionEvent),
    Avatar(AvatarEvent),
    Timer(TimerEvent),
}

impl From<RawRecognitionEvent> for SessionEvent {
    fn from(event: RawRecognitionEvent) -> Self {
        SessionEvent::Recognition(event)
    }
}

impl From<AvatarEvent> for SessionEvent {
    fn from(event: AvatarEvent) -> Self {
        SessionEvent::Avatar(event)
    }
}
