//! Language-model collaborator.
//!
//! This module provides:
//! * [`ChatCompleter`] — async trait implemented by all completion backends.
//! * [`ApiCompleter`] — OpenAI-compatible REST API backend.
//! * [`CompletionRequest`] — message + active language + context window.
//! * [`CompletionError`] — error variants for completion calls.
//!
//! The orchestrator treats the collaborator as a black box: a turn either
//! yields a reply string or fails, in which case a localized fallback is
//! spoken instead.

pub mod completer;
pub mod prompt;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use completer::{ApiCompleter, ChatCompleter, CompletionError, CompletionRequest};
pub use prompt::system_prompt;
