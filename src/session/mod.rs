//! Session subsystem — the voice-turn state machine.
//!
//! # Architecture
//!
//! ```text
//!  commands ─┐
//!  timers ───┤                       ┌──▶ SpeechChannel ──▶ recognition
//!  avatar ───┼─▶ mpsc ─▶ dispatch() ─┤
//!  speech ───┘          (one event   ├──▶ ChatCompleter ──▶ reply
//!                        at a time)  └──▶ AvatarChannel ──▶ speech
//! ```
//!
//! * [`events`] — the unified [`SessionEvent`] stream.
//! * [`state`] — [`TurnState`] + transition table, the [`Session`] state
//!   object, and the [`SharedStatus`] mirror for UIs.
//! * [`orchestrator`] — [`TurnOrchestrator`], the event loop that ties the
//!   speech and avatar channels into one conversational turn order.

pub mod events;
pub mod orchestrator;
pub mod state;

// ── Public re-exports ──────────────────────────────────────────────────────

pub use events::{SessionCommand, SessionEvent, TimerEvent, TimerKind};
pub use orchestrator::TurnOrchestrator;
pub use state::{new_shared_status, KioskStatus, Session, SharedStatus, TurnState};
