//! Speech input channel — single-active-handle wrapper over the recognition
//! capability.
//!
//! [`SpeechChannel`] owns at most one live [`RecognitionHandle`] at a time
//! and turns the provider's raw event stream into the narrow surface the
//! orchestrator consumes:
//!
//! * interim results are swallowed (they only stamp the liveness clock),
//! * final results run the [`LanguageDetector`] and surface as
//!   [`SpeechEvent::Transcript`],
//! * errors are surfaced pre-classified; the channel itself never retries —
//!   restart policy belongs to the orchestrator.
//!
//! Events from a handle that has been stopped or replaced are discarded by
//! generation id, so a trailing `Ended` from a dead handle can never trigger
//! a spurious restart.

use std::sync::Arc;

use tokio::time::Instant;

use crate::language::{LanguageDetector, LanguageTag};
use crate::speech::provider::{
    RawEventKind, RawRecognitionEvent, RecognitionErrorKind, RecognitionHandle,
    RecognitionProvider, RecognitionSink, SpeechError,
};

// ---------------------------------------------------------------------------
// SpeechEvent
// ---------------------------------------------------------------------------

/// Filtered speech-input events, as seen by the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum SpeechEvent {
    /// The live handle began capturing audio.
    Started,
    /// A final transcript, with its detected language.
    Transcript {
        text: String,
        language: LanguageTag,
    },
    /// The live handle stopped on its own.
    Ended,
    /// The live handle reported an error.
    Error(RecognitionErrorKind),
}

// ---------------------------------------------------------------------------
// SpeechChannel
// ---------------------------------------------------------------------------

/// Wraps the recognition capability, enforcing the single-active-handle
/// invariant and performing final-result filtering.
pub struct SpeechChannel {
    provider: Arc<dyn RecognitionProvider>,
    sink: RecognitionSink,
    detector: LanguageDetector,
    handle: Option<Box<dyn RecognitionHandle>>,
    generation: u64,
    last_activity: Instant,
}

impl SpeechChannel {
    /// Create a channel over `provider`.  Raw events flow into `sink`; the
    /// orchestrator routes them back through [`accept`](Self::accept).
    pub fn new(
        provider: Arc<dyn RecognitionProvider>,
        sink: RecognitionSink,
        detector: LanguageDetector,
    ) -> Self {
        Self {
            provider,
            sink,
            detector,
            handle: None,
            generation: 0,
            last_activity: Instant::now(),
        }
    }

    /// Start listening in `language`.
    ///
    /// Fails fast with [`SpeechError::Unavailable`] when the platform has no
    /// recognition capability.  Any previously active handle is stopped and
    /// discarded first.
    pub fn start(&mut self, language: LanguageTag) -> Result<(), SpeechError> {
        if !self.provider.is_available() {
            return Err(SpeechError::Unavailable);
        }

        self.stop();
        self.generation += 1;

        let handle = self.provider.start(
            language.recognition_locale(),
            self.generation,
            self.sink.clone(),
        )?;
        self.handle = Some(handle);
        self.last_activity = Instant::now();
        log::debug!(
            "speech: handle {} started (locale={})",
            self.generation,
            language.recognition_locale()
        );
        Ok(())
    }

    /// Stop the active handle, if any.  Idempotent.
    pub fn stop(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.stop();
            log::debug!("speech: handle {} stopped", self.generation);
        }
    }

    /// Whether a handle is currently live.
    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    /// Liveness clock: when the live handle last produced any event.
    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }

    /// Filter a raw provider event.
    ///
    /// Returns `None` for events that carry no policy significance: interim
    /// results, and anything from a stale (stopped or replaced) handle.
    /// Every accepted event stamps the liveness clock.
    pub fn accept(&mut self, raw: RawRecognitionEvent) -> Option<SpeechEvent> {
        if raw.generation != self.generation || self.handle.is_none() {
            log::trace!("speech: dropping stale event {:?}", raw.kind);
            return None;
        }

        self.last_activity = Instant::now();

        match raw.kind {
            RawEventKind::Started => Some(SpeechEvent::Started),
            RawEventKind::Interim(_) => None,
            RawEventKind::Final(text) => {
                let language = self.detector.detect(&text);
                log::debug!("speech: final transcript ({}): {:?}", language, text);
                Some(SpeechEvent::Transcript { text, language })
            }
            RawEventKind::Ended => {
                // The handle is gone; trailing events from it are now stale.
                self.handle = None;
                Some(SpeechEvent::Ended)
            }
            RawEventKind::Error(kind) => Some(SpeechEvent::Error(kind)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::provider::MockRecognitionProvider;
    use tokio::sync::mpsc;

    fn make_channel(provider: Arc<MockRecognitionProvider>) -> SpeechChannel {
        let (sink, _raw_rx) = mpsc::channel(16);
        SpeechChannel::new(provider, sink, LanguageDetector::new(LanguageTag::Ru))
    }

    fn event(generation: u64, kind: RawEventKind) -> RawRecognitionEvent {
        RawRecognitionEvent { generation, kind }
    }

    #[tokio::test]
    async fn start_fails_fast_when_unavailable() {
        let provider = Arc::new(MockRecognitionProvider::unavailable());
        let mut channel = make_channel(Arc::clone(&provider));

        let err = channel.start(LanguageTag::Ru).unwrap_err();
        assert!(matches!(err, SpeechError::Unavailable));
        assert!(!channel.is_active());
        assert_eq!(provider.start_count(), 0);
    }

    #[tokio::test]
    async fn start_passes_recognition_locale() {
        let provider = Arc::new(MockRecognitionProvider::new());
        let mut channel = make_channel(Arc::clone(&provider));

        channel.start(LanguageTag::Es).unwrap();
        assert_eq!(provider.last_locale().as_deref(), Some("es-ES"));
    }

    #[tokio::test]
    async fn restart_stops_previous_handle_first() {
        let provider = Arc::new(MockRecognitionProvider::new());
        let mut channel = make_channel(Arc::clone(&provider));

        channel.start(LanguageTag::Ru).unwrap();
        channel.start(LanguageTag::En).unwrap();

        assert_eq!(provider.start_count(), 2);
        // Never more than one handle live, even across the restart.
        assert_eq!(provider.max_active_handles(), 1);
        assert_eq!(provider.active_handles(), 1);
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let provider = Arc::new(MockRecognitionProvider::new());
        let mut channel = make_channel(Arc::clone(&provider));

        channel.stop(); // no handle yet — must not panic
        channel.start(LanguageTag::Ru).unwrap();
        channel.stop();
        channel.stop();
        assert_eq!(provider.active_handles(), 0);
    }

    #[tokio::test]
    async fn interim_results_are_swallowed_but_stamp_liveness() {
        let provider = Arc::new(MockRecognitionProvider::new());
        let mut channel = make_channel(provider);
        channel.start(LanguageTag::Ru).unwrap();
        let generation = 1;

        let before = channel.last_activity();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        let out = channel.accept(event(generation, RawEventKind::Interim("при".into())));
        assert_eq!(out, None);
        assert!(channel.last_activity() > before);
    }

    #[tokio::test]
    async fn final_result_surfaces_with_detected_language() {
        let provider = Arc::new(MockRecognitionProvider::new());
        let mut channel = make_channel(provider);
        channel.start(LanguageTag::Ru).unwrap();

        let out = channel.accept(event(1, RawEventKind::Final("Hola, gracias".into())));
        assert_eq!(
            out,
            Some(SpeechEvent::Transcript {
                text: "Hola, gracias".into(),
                language: LanguageTag::Es,
            })
        );
    }

    #[tokio::test]
    async fn stale_generation_events_are_dropped() {
        let provider = Arc::new(MockRecognitionProvider::new());
        let mut channel = make_channel(provider);

        channel.start(LanguageTag::Ru).unwrap(); // generation 1
        channel.start(LanguageTag::Ru).unwrap(); // generation 2

        let out = channel.accept(event(1, RawEventKind::Final("stale".into())));
        assert_eq!(out, None);
    }

    #[tokio::test]
    async fn events_after_deliberate_stop_are_dropped() {
        let provider = Arc::new(MockRecognitionProvider::new());
        let mut channel = make_channel(provider);

        channel.start(LanguageTag::Ru).unwrap();
        channel.stop();

        // The platform delivers a trailing Ended for the stopped handle; it
        // must not surface (it would otherwise schedule a restart).
        let out = channel.accept(event(1, RawEventKind::Ended));
        assert_eq!(out, None);
    }

    #[tokio::test]
    async fn ended_clears_the_handle() {
        let provider = Arc::new(MockRecognitionProvider::new());
        let mut channel = make_channel(provider);
        channel.start(LanguageTag::Ru).unwrap();

        let out = channel.accept(event(1, RawEventKind::Ended));
        assert_eq!(out, Some(SpeechEvent::Ended));
        assert!(!channel.is_active());

        // Anything after Ended from the same generation is stale.
        let out = channel.accept(event(1, RawEventKind::Error(RecognitionErrorKind::Aborted)));
        assert_eq!(out, None);
    }

    #[tokio::test]
    async fn errors_surface_classified() {
        let provider = Arc::new(MockRecognitionProvider::new());
        let mut channel = make_channel(provider);
        channel.start(LanguageTag::Ru).unwrap();

        let out = channel.accept(event(1, RawEventKind::Error(RecognitionErrorKind::Network)));
        assert_eq!(out, Some(SpeechEvent::Error(RecognitionErrorKind::Network)));
        // The handle is left in place; the orchestrator decides whether to
        // stop and retry.
        assert!(channel.is_active());
    }
}
