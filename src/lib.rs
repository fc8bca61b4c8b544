//! voice-kiosk — voice-turn orchestration for a virtual-avatar kiosk.
//!
//! The crate implements the conversational core of a kiosk whose visitors
//! talk to a streaming avatar: deciding moment to moment whether the system
//! is listening, thinking or speaking, switching recognition language when
//! the visitor switches, and self-healing recognition sessions that silently
//! die.
//!
//! # Modules
//!
//! * [`session`] — the [`TurnOrchestrator`](session::TurnOrchestrator) state
//!   machine and its event stream.
//! * [`speech`] — the speech-input channel over the platform recognition
//!   capability.
//! * [`avatar`] — the avatar collaborator boundary.
//! * [`llm`] — the language-model collaborator boundary.
//! * [`language`] — supported locales and transcript language detection.
//! * [`conversation`] — the per-session conversation log.
//! * [`config`] — settings, defaults and TOML persistence.

pub mod avatar;
pub mod config;
pub mod conversation;
pub mod language;
pub mod llm;
pub mod session;
pub mod speech;
