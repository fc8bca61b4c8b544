//! Speech input subsystem.
//!
//! Two layers:
//!
//! * [`provider`] — the boundary to the platform's speech-recognition
//!   capability ([`RecognitionProvider`] / [`RecognitionHandle`]), its raw
//!   event stream, and the retryable/non-retryable error classification.
//! * [`channel`] — [`SpeechChannel`], the orchestrator-facing wrapper that
//!   enforces the single-active-handle invariant, swallows interim results,
//!   runs language detection on finals, and keeps the liveness clock.

pub mod channel;
pub mod provider;

// ── Public re-exports ──────────────────────────────────────────────────────

pub use channel::{SpeechChannel, SpeechEvent};
pub use provider::{
    RawEventKind, RawRecognitionEvent, RecognitionErrorKind, RecognitionHandle,
    RecognitionProvider, RecognitionSink, SpeechError,
};

// test-only re-export so the session tests can import the mock without the
// full provider path.
#[cfg(test)]
pub use provider::MockRecognitionProvider;
