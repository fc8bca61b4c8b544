//! Heuristic language detection over final transcripts.
//!
//! [`LanguageDetector::detect`] is a total function: it always returns a
//! [`LanguageTag`], falling back to the configured default when the text
//! carries no signal.  Detection runs in four stages, first match wins:
//!
//! 1. Unique-script match — CJK ideographs, Japanese syllabaries, Arabic,
//!    Devanagari, Armenian.  A script that belongs to exactly one supported
//!    language decides immediately.
//! 2. Lexical cues — common greetings/function words for the languages that
//!    share a script with others (Spanish, French, Portuguese, German,
//!    Italian, Kazakh in Cyrillic, Uzbek in Latin), matched whole-word and
//!    case-insensitively.
//! 3. Script fallback — any remaining Cyrillic text is Russian, any text
//!    containing a Latin letter is English.
//! 4. The configured default language.
//!
//! The stage order is behaviour, not style: unique scripts must win over
//! lexical accidents, and lexical cues must run before the Latin catch-all
//! or `"Hola, gracias"` would read as English.

use std::sync::LazyLock;

use regex::Regex;

use super::LanguageTag;

// ---------------------------------------------------------------------------
// Lexical cue patterns
// ---------------------------------------------------------------------------

/// Whole-word, case-insensitive cue lists.  Checked in order; the order
/// resolves overlaps ("por favor" is both Spanish and Portuguese — Spanish
/// is checked first and wins).
static LEXICAL_CUES: LazyLock<Vec<(LanguageTag, Regex)>> = LazyLock::new(|| {
    vec![
        (
            LanguageTag::Es,
            Regex::new(r"(?i)\b(hola|gracias|por favor|buenos|buenas|señor|señora)\b").unwrap(),
        ),
        (
            LanguageTag::Fr,
            Regex::new(r"(?i)\b(bonjour|merci|s'il vous plaît|monsieur|madame|comment|pourquoi)\b")
                .unwrap(),
        ),
        (
            LanguageTag::Pt,
            Regex::new(r"(?i)\b(olá|obrigado|por favor|senhor|senhora|como|porque)\b").unwrap(),
        ),
        (
            LanguageTag::De,
            Regex::new(r"(?i)\b(hallo|danke|bitte|herr|frau|wie|warum|ich|sie|das|der|die)\b")
                .unwrap(),
        ),
        (
            LanguageTag::It,
            Regex::new(r"(?i)\b(ciao|grazie|prego|signore|signora|come|perché|sono|sei)\b")
                .unwrap(),
        ),
        (
            LanguageTag::Kk,
            Regex::new(r"(?i)\b(сәлем|рахмет|қалайсыз|қандай)\b").unwrap(),
        ),
        (
            LanguageTag::Uz,
            Regex::new(r"(?i)\b(salom|rahmat|iltimos|janob|xonim|qanday|nima)\b").unwrap(),
        ),
    ]
});

// ---------------------------------------------------------------------------
// Script range checks
// ---------------------------------------------------------------------------

fn has_cyrillic(text: &str) -> bool {
    text.chars()
        .any(|c| matches!(c, 'а'..='я' | 'А'..='Я' | 'ё' | 'Ё'))
}

fn has_cjk(text: &str) -> bool {
    text.chars()
        .any(|c| matches!(c, '\u{4e00}'..='\u{9fff}' | '\u{3400}'..='\u{4dbf}'))
}

fn has_kana(text: &str) -> bool {
    text.chars()
        .any(|c| matches!(c, '\u{3040}'..='\u{309f}' | '\u{30a0}'..='\u{30ff}'))
}

fn has_arabic(text: &str) -> bool {
    text.chars()
        .any(|c| matches!(c, '\u{0600}'..='\u{06ff}' | '\u{0750}'..='\u{077f}'))
}

fn has_devanagari(text: &str) -> bool {
    text.chars().any(|c| matches!(c, '\u{0900}'..='\u{097f}'))
}

fn has_armenian(text: &str) -> bool {
    text.chars().any(|c| matches!(c, '\u{0530}'..='\u{058f}'))
}

fn has_latin(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_alphabetic())
}

// ---------------------------------------------------------------------------
// LanguageDetector
// ---------------------------------------------------------------------------

/// Classifies transcript text into a [`LanguageTag`].
///
/// # Example
/// ```
/// use voice_kiosk::language::{LanguageDetector, LanguageTag};
///
/// let detector = LanguageDetector::new(LanguageTag::Ru);
/// assert_eq!(detector.detect("Hola, gracias"), LanguageTag::Es);
/// assert_eq!(detector.detect("12345"), LanguageTag::Ru);
/// ```
#[derive(Debug, Clone)]
pub struct LanguageDetector {
    default_language: LanguageTag,
}

impl LanguageDetector {
    /// Create a detector whose final fallback is `default_language`.
    pub fn new(default_language: LanguageTag) -> Self {
        Self { default_language }
    }

    /// The configured fallback language.
    pub fn default_language(&self) -> LanguageTag {
        self.default_language
    }

    /// Detect the language of `text`.  Never fails.
    pub fn detect(&self, text: &str) -> LanguageTag {
        // 1. Scripts that belong to exactly one supported language.
        //    CJK is checked before kana: text containing any ideograph is
        //    classified Chinese, pure-kana text Japanese.
        if has_cjk(text) {
            return LanguageTag::Zh;
        }
        if has_kana(text) {
            return LanguageTag::Ja;
        }
        if has_arabic(text) {
            return LanguageTag::Ar;
        }
        if has_devanagari(text) {
            return LanguageTag::Hi;
        }
        if has_armenian(text) {
            return LanguageTag::Hy;
        }

        // 2. Lexical cues for the shared-script languages.
        for (tag, cue) in LEXICAL_CUES.iter() {
            if cue.is_match(text) {
                return *tag;
            }
        }

        // 3. Script fallback.
        if has_cyrillic(text) {
            return LanguageTag::Ru;
        }
        if has_latin(text) {
            return LanguageTag::En;
        }

        // 4. No signal at all.
        self.default_language
    }
}

impl Default for LanguageDetector {
    fn default() -> Self {
        Self::new(LanguageTag::Ru)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
