//! Recognition capability seam.
//!
//! # Overview
//!
//! [`RecognitionProvider`] is the boundary to whatever continuous
//! speech-recognition capability the platform offers.  It is object-safe and
//! `Send + Sync` so it can be held behind an `Arc<dyn RecognitionProvider>`.
//!
//! A provider is started in continuous, interim-results mode for one locale
//! and pushes [`RawRecognitionEvent`]s into the sink it was given.  Every
//! event carries the generation id assigned at start time; the
//! [`SpeechChannel`](crate::speech::SpeechChannel) uses it to discard events
//! from handles that have already been replaced.
//!
//! Availability is not guaranteed — callers must check
//! [`is_available`](RecognitionProvider::is_available) and fail fast when
//! the capability is missing.

use thiserror::Error;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// SpeechError
// ---------------------------------------------------------------------------

/// Errors surfaced by the speech-input subsystem.
#[derive(Debug, Clone, Error)]
pub enum SpeechError {
    /// The platform has no speech-recognition capability at all.
    #[error("speech recognition is not available on this platform")]
    Unavailable,

    /// The provider failed to start a recognition attempt.
    #[error("failed to start recognition: {0}")]
    Start(String),
}

// ---------------------------------------------------------------------------
// RecognitionErrorKind
// ---------------------------------------------------------------------------

/// Classified recognition error codes.
///
/// The classification decides the orchestrator's recovery policy: anything
/// other than `NoSpeech`, `Aborted` and `PermissionDenied` is retryable
/// with back-off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionErrorKind {
    /// No audio was detected before the recognizer's own silence timeout.
    /// Benign — the recognizer is alive, it just heard nothing.
    NoSpeech,
    /// The attempt was aborted, usually by our own `stop()` call.
    Aborted,
    /// Microphone permission was denied; requires user action.
    PermissionDenied,
    /// Network failure between the platform and its recognition service.
    Network,
    /// Audio capture failed (device unplugged, busy, …).
    AudioCapture,
    /// The recognition service rejected or dropped the session.
    ServiceDown,
    /// Anything the platform reports that we do not recognise.
    Other(String),
}

impl RecognitionErrorKind {
    /// Whether the orchestrator should re-enter listening after back-off.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            RecognitionErrorKind::NoSpeech
                | RecognitionErrorKind::Aborted
                | RecognitionErrorKind::PermissionDenied
        )
    }
}

// ---------------------------------------------------------------------------
// RawRecognitionEvent
// ---------------------------------------------------------------------------

/// Kind of event emitted by a recognition handle.
#[derive(Debug, Clone, PartialEq)]
pub enum RawEventKind {
    /// The handle began capturing audio.
    Started,
    /// A partial, revisable result.
    Interim(String),
    /// A complete result; the transcript will not change.
    Final(String),
    /// The handle stopped emitting events (normal lifecycle end).
    Ended,
    /// The handle reported an error.  Usually followed by `Ended`.
    Error(RecognitionErrorKind),
}

/// An event from the recognition capability, tagged with the generation of
/// the handle that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecognitionEvent {
    pub generation: u64,
    pub kind: RawEventKind,
}

/// Channel endpoint providers push their events into.
pub type RecognitionSink = mpsc::Sender<RawRecognitionEvent>;

// ---------------------------------------------------------------------------
// RecognitionProvider / RecognitionHandle
// ---------------------------------------------------------------------------

/// Platform speech-recognition capability.
///
/// # Contract
///
/// - `start` opens one continuous, interim-results recognition attempt for
///   `locale` (a BCP-47 tag such as `"ru-RU"`) and returns its handle.
///   Every event the attempt emits must be tagged with `generation`.
/// - Providers never restart themselves; lifecycle policy belongs to the
///   caller.
pub trait RecognitionProvider: Send + Sync {
    /// Whether the capability exists at all on this platform.
    fn is_available(&self) -> bool;

    /// Begin a recognition attempt.  The returned handle owns the attempt;
    /// dropping or stopping it must cease event emission promptly.
    fn start(
        &self,
        locale: &str,
        generation: u64,
        sink: RecognitionSink,
    ) -> Result<Box<dyn RecognitionHandle>, SpeechError>;
}

/// One live recognition attempt.
pub trait RecognitionHandle: Send {
    /// Stop the attempt.  Idempotent.
    fn stop(&mut self);
}

// Compile-time assertion: the provider must stay object-safe.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn RecognitionProvider>, _: Box<dyn RecognitionHandle>) {}
};

// ---------------------------------------------------------------------------
// MockRecognitionProvider — test double
// ---------------------------------------------------------------------------

/// Test provider that records every `start` call and counts live handles.
///
/// Tests inject events themselves (tagged with
/// [`last_generation`](Self::last_generation)); the mock only does
/// book-keeping, which is what the single-active-handle assertions need.
#[cfg(test)]
pub struct MockRecognitionProvider {
    available: bool,
    state: std::sync::Arc<std::sync::Mutex<MockProviderState>>,
}

#[cfg(test)]
#[derive(Default)]
struct MockProviderState {
    active: usize,
    max_active: usize,
    starts: Vec<StartRecord>,
}

#[cfg(test)]
#[derive(Clone)]
pub struct StartRecord {
    pub locale: String,
    pub generation: u64,
    pub sink: RecognitionSink,
}

#[cfg(test)]
impl MockRecognitionProvider {
    pub fn new() -> Self {
        Self {
            available: true,
            state: Default::default(),
        }
    }

    /// A provider whose capability check always fails.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            state: Default::default(),
        }
    }

    pub fn start_count(&self) -> usize {
        self.state.lock().unwrap().starts.len()
    }

    pub fn active_handles(&self) -> usize {
        self.state.lock().unwrap().active
    }

    /// High-water mark of simultaneously live handles.
    pub fn max_active_handles(&self) -> usize {
        self.state.lock().unwrap().max_active
    }

    pub fn last_locale(&self) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .starts
            .last()
            .map(|r| r.locale.clone())
    }

    pub fn last_generation(&self) -> Option<u64> {
        self.state.lock().unwrap().starts.last().map(|r| r.generation)
    }

    /// Emit an event from the most recently started handle, through the sink
    /// it was given.  Panics if nothing was started yet.
    pub async fn emit(&self, kind: RawEventKind) {
        let record = self
            .state
            .lock()
            .unwrap()
            .starts
            .last()
            .cloned()
            .expect("no recognition attempt started");
        record
            .sink
            .send(RawRecognitionEvent {
                generation: record.generation,
                kind,
            })
            .await
            .expect("recognition sink closed");
    }
}

#[cfg(test)]
impl RecognitionProvider for MockRecognitionProvider {
    fn is_available(&self) -> bool {
        self.available
    }

    fn start(
        &self,
        locale: &str,
        generation: u64,
        sink: RecognitionSink,
    ) -> Result<Box<dyn RecognitionHandle>, SpeechError> {
        let mut state = self.state.lock().unwrap();
        state.starts.push(StartRecord {
            locale: locale.to_string(),
            generation,
            sink,
        });
        state.active += 1;
        state.max_active = state.max_active.max(state.active);
        drop(state);

        Ok(Box::new(MockHandle {
            state: std::sync::Arc::clone(&self.state),
            stopped: false,
        }))
    }
}

#[cfg(test)]
struct MockHandle {
    state: std::sync::Arc<std::sync::Mutex<MockProviderState>>,
    stopped: bool,
}

#[cfg(test)]
impl MockHandle {
    fn release(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.state.lock().unwrap().active -= 1;
        }
    }
}

#[cfg(test)]
impl RecognitionHandle for MockHandle {
    fn stop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
impl Drop for MockHandle {
    fn drop(&mut self) {
        self.release();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
