//! Avatar speech channel — external collaborator boundary.
//!
//! The streaming avatar synthesizes and plays replies.  This crate does not
//! reimplement it; [`AvatarChannel`] is the seam, and implementations push
//! [`AvatarEvent`]s into the session's event stream.  `speak` is
//! fire-and-forget: completion is signalled by [`AvatarEvent::Stopped`], not
//! by the call returning.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// AvatarError
// ---------------------------------------------------------------------------

/// Errors surfaced by the avatar collaborator.
#[derive(Debug, Clone, Error)]
pub enum AvatarError {
    /// The speak request was rejected or the stream dropped it.
    #[error("avatar speak request failed: {0}")]
    Speak(String),

    /// Session teardown failed.
    #[error("avatar stop failed: {0}")]
    Stop(String),
}

// ---------------------------------------------------------------------------
// AvatarEvent
// ---------------------------------------------------------------------------

/// Speaking-state events from the avatar stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvatarEvent {
    /// Output audio started playing.
    Started,
    /// Output audio finished playing.
    Stopped,
    /// The stream disconnected; the session must end.
    Disconnected,
}

/// Channel endpoint avatar implementations push their events into.
pub type AvatarSink = mpsc::Sender<AvatarEvent>;

// ---------------------------------------------------------------------------
// AvatarChannel
// ---------------------------------------------------------------------------

/// The avatar collaborator.
///
/// Implementations must be `Send + Sync` so they can be shared as
/// `Arc<dyn AvatarChannel>`.
#[async_trait]
pub trait AvatarChannel: Send + Sync {
    /// Ask the avatar to speak `text` with the given synthesis voice.
    ///
    /// Returns once the request is accepted; actual playback start/stop is
    /// reported through [`AvatarEvent`]s.
    async fn speak(&self, text: &str, voice_id: &str) -> Result<(), AvatarError>;

    /// Tear the avatar stream down.
    async fn stop(&self) -> Result<(), AvatarError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
