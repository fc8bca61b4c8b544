//! Append-only conversation record for one kiosk session.
//!
//! [`ConversationLog`] keeps turns in strict chronological order and exposes
//! [`recent_window`](ConversationLog::recent_window) — the trailing slice
//! handed to the language model as context for the next completion call.
//! Storage itself is capped at `max_turns`, so a kiosk left running all day
//! does not grow without bound.
//!
//! The log is owned by one session and cleared at session start and end; no
//! mutation other than `append` and `clear` is possible.

use std::collections::VecDeque;
use std::time::SystemTime;

use crate::language::LanguageTag;

// ---------------------------------------------------------------------------
// Speaker / ConversationTurn
// ---------------------------------------------------------------------------

/// Which side of the conversation produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
}

/// One utterance in the conversation.  Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationTurn {
    pub speaker: Speaker,
    pub text: String,
    pub language: LanguageTag,
    pub timestamp: SystemTime,
}

impl ConversationTurn {
    /// A turn spoken by the visitor.
    pub fn user(text: impl Into<String>, language: LanguageTag) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
            language,
            timestamp: SystemTime::now(),
        }
    }

    /// A turn spoken by the avatar.
    pub fn assistant(text: impl Into<String>, language: LanguageTag) -> Self {
        Self {
            speaker: Speaker::Assistant,
            text: text.into(),
            language,
            timestamp: SystemTime::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// ConversationLog
// ---------------------------------------------------------------------------

/// Ordered record of the session's turns, bounded to a trailing window.
#[derive(Debug, Clone)]
pub struct ConversationLog {
    turns: VecDeque<ConversationTurn>,
    max_turns: usize,
}

impl ConversationLog {
    /// Create an empty log that retains at most `max_turns` turns.
    pub fn new(max_turns: usize) -> Self {
        Self {
            turns: VecDeque::new(),
            max_turns: max_turns.max(1),
        }
    }

    /// Append a turn.  The oldest turn is dropped once the cap is reached.
    pub fn append(&mut self, turn: ConversationTurn) {
        self.turns.push_back(turn);
        while self.turns.len() > self.max_turns {
            self.turns.pop_front();
        }
    }

    /// The last `n` turns in chronological order, cloned for handoff to the
    /// completion request.
    pub fn recent_window(&self, n: usize) -> Vec<ConversationTurn> {
        let skip = self.turns.len().saturating_sub(n);
        self.turns.iter().skip(skip).cloned().collect()
    }

    /// Drop every turn.  Called at session start and session end.
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(speaker: Speaker, text: &str) -> ConversationTurn {
        match speaker {
            Speaker::User => ConversationTurn::user(text, LanguageTag::Ru),
            Speaker::Assistant => ConversationTurn::assistant(text, LanguageTag::Ru),
        }
    }

    #[test]
    fn appends_in_chronological_order() {
        let mut log = ConversationLog::new(10);
        log.append(turn(Speaker::User, "first"));
        log.append(turn(Speaker::Assistant, "second"));
        log.append(turn(Speaker::User, "third"));

        let window = log.recent_window(10);
        let texts: Vec<&str> = window.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["first", "second", "third"]);
    }

    #[test]
    fn recent_window_returns_last_n_in_order() {
        let mut log = ConversationLog::new(10);
        for i in 0..5 {
            log.append(turn(Speaker::User, &format!("turn {i}")));
        }

        let window = log.recent_window(2);
        let texts: Vec<&str> = window.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["turn 3", "turn 4"]);
    }

    #[test]
    fn recent_window_larger_than_log_returns_everything() {
        let mut log = ConversationLog::new(10);
        log.append(turn(Speaker::User, "only"));
        assert_eq!(log.recent_window(100).len(), 1);
    }

    #[test]
    fn storage_is_capped_at_max_turns() {
        let mut log = ConversationLog::new(3);
        for i in 0..6 {
            log.append(turn(Speaker::User, &format!("turn {i}")));
        }

        assert_eq!(log.len(), 3);
        let texts: Vec<String> = log
            .recent_window(3)
            .into_iter()
            .map(|t| t.text)
            .collect();
        assert_eq!(texts, ["turn 3", "turn 4", "turn 5"]);
    }

    #[test]
    fn clear_empties_the_log() {
        let mut log = ConversationLog::new(5);
        log.append(turn(Speaker::User, "hello"));
        log.clear();
        assert!(log.is_empty());
        assert!(log.recent_window(5).is_empty());
    }

    #[test]
    fn turn_constructors_set_speaker_and_language() {
        let user = ConversationTurn::user("q", LanguageTag::Es);
        assert_eq!(user.speaker, Speaker::User);
        assert_eq!(user.language, LanguageTag::Es);

        let assistant = ConversationTurn::assistant("a", LanguageTag::En);
        assert_eq!(assistant.speaker, Speaker::Assistant);
    }
}
