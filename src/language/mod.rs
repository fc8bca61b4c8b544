//! Language model for the kiosk: supported locales and detection.
//!
//! [`LanguageTag`] enumerates every language the kiosk can listen to and
//! answer in.  Each tag maps to a BCP-47 recognition locale (what the
//! speech-recognition capability expects) and carries the localized welcome
//! and fallback phrases spoken by the avatar.
//!
//! [`LanguageDetector`] (in [`detector`]) classifies a final transcript into
//! a `LanguageTag` so the orchestrator can switch the recognition locale and
//! synthesis voice mid-session.

pub mod detector;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use detector::LanguageDetector;

// ---------------------------------------------------------------------------
// LanguageTag
// ---------------------------------------------------------------------------

/// A supported conversation language.
///
/// Serialized as the ISO-639-1 code (`"ru"`, `"en"`, …) in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageTag {
    Ru,
    En,
    Es,
    Fr,
    Zh,
    Pt,
    Hi,
    Ar,
    De,
    Ja,
    Hy,
    Kk,
    Uz,
    It,
}

/// All supported languages, in a stable order.
pub const ALL_LANGUAGES: [LanguageTag; 14] = [
    LanguageTag::Ru,
    LanguageTag::En,
    LanguageTag::Es,
    LanguageTag::Fr,
    LanguageTag::Zh,
    LanguageTag::Pt,
    LanguageTag::Hi,
    LanguageTag::Ar,
    LanguageTag::De,
    LanguageTag::Ja,
    LanguageTag::Hy,
    LanguageTag::Kk,
    LanguageTag::Uz,
    LanguageTag::It,
];

impl LanguageTag {
    /// ISO-639-1 code, as used in config files and the completion request.
    pub fn code(self) -> &'static str {
        match self {
            LanguageTag::Ru => "ru",
            LanguageTag::En => "en",
            LanguageTag::Es => "es",
            LanguageTag::Fr => "fr",
            LanguageTag::Zh => "zh",
            LanguageTag::Pt => "pt",
            LanguageTag::Hi => "hi",
            LanguageTag::Ar => "ar",
            LanguageTag::De => "de",
            LanguageTag::Ja => "ja",
            LanguageTag::Hy => "hy",
            LanguageTag::Kk => "kk",
            LanguageTag::Uz => "uz",
            LanguageTag::It => "it",
        }
    }

    /// BCP-47 locale handed to the speech-recognition capability.
    pub fn recognition_locale(self) -> &'static str {
        match self {
            LanguageTag::Ru => "ru-RU",
            LanguageTag::En => "en-US",
            LanguageTag::Es => "es-ES",
            LanguageTag::Fr => "fr-FR",
            LanguageTag::Zh => "zh-CN",
            LanguageTag::Pt => "pt-BR",
            LanguageTag::Hi => "hi-IN",
            LanguageTag::Ar => "ar-SA",
            LanguageTag::De => "de-DE",
            LanguageTag::Ja => "ja-JP",
            LanguageTag::Hy => "hy-AM",
            LanguageTag::Kk => "kk-KZ",
            LanguageTag::Uz => "uz-UZ",
            LanguageTag::It => "it-IT",
        }
    }

    /// English name of the language, used when building completion prompts.
    pub fn english_name(self) -> &'static str {
        match self {
            LanguageTag::Ru => "Russian",
            LanguageTag::En => "English",
            LanguageTag::Es => "Spanish",
            LanguageTag::Fr => "French",
            LanguageTag::Zh => "Chinese",
            LanguageTag::Pt => "Portuguese",
            LanguageTag::Hi => "Hindi",
            LanguageTag::Ar => "Arabic",
            LanguageTag::De => "German",
            LanguageTag::Ja => "Japanese",
            LanguageTag::Hy => "Armenian",
            LanguageTag::Kk => "Kazakh",
            LanguageTag::Uz => "Uzbek",
            LanguageTag::It => "Italian",
        }
    }

    /// Localized welcome message spoken when a session starts.
    pub fn greeting(self) -> &'static str {
        match self {
            LanguageTag::Ru => {
                "Здравствуйте! Я ваш виртуальный ассистент. Чем могу вам помочь?"
            }
            LanguageTag::En => "Hello! I am your virtual assistant. How can I help you?",
            LanguageTag::Es => "¡Hola! Soy su asistente virtual. ¿Cómo puedo ayudarle?",
            LanguageTag::Fr => {
                "Bonjour! Je suis votre assistant virtuel. Comment puis-je vous aider?"
            }
            LanguageTag::Zh => "你好！我是您的虚拟助手。我能为您做什么？",
            LanguageTag::Pt => "Olá! Eu sou seu assistente virtual. Como posso ajudá-lo?",
            LanguageTag::Hi => {
                "नमस्ते! मैं आपका वर्चुअल सहायक हूं। मैं आपकी कैसे मदद कर सकता हूं?"
            }
            LanguageTag::Ar => "مرحبا! أنا مساعدك الافتراضي. كيف يمكنني مساعدتك؟",
            LanguageTag::De => {
                "Hallo! Ich bin Ihr virtueller Assistent. Wie kann ich Ihnen helfen?"
            }
            LanguageTag::Ja => {
                "こんにちは！私はバーチャルアシスタントです。どのようにお手伝いできますか？"
            }
            LanguageTag::Hy => {
                "Բարև Ձեզ! Ես Ձեր վիրտուալ օգնականն եմ։ Ինչպե՞ս կարող եմ օգնել Ձեզ:"
            }
            LanguageTag::Kk => {
                "Сәлеметсіз бе! Мен сіздің виртуалды көмекшіңізбін. Сізге қалай көмектесе аламын?"
            }
            LanguageTag::Uz => {
                "Salom! Men sizning virtual yordamchingizman. Sizga qanday yordam bera olaman?"
            }
            LanguageTag::It => {
                "Ciao! Sono il tuo assistente virtuale. Come posso aiutarti?"
            }
        }
    }

    /// Localized apology spoken when the language-model call fails mid-turn.
    ///
    /// Dedicated wording exists for Russian; every other language uses the
    /// English phrase (the synthesis voice still matches the active
    /// language).
    pub fn fallback_reply(self) -> &'static str {
        match self {
            LanguageTag::Ru => {
                "Извините, произошла ошибка при обработке вашего сообщения. Пожалуйста, попробуйте ещё раз."
            }
            _ => "Sorry, an error occurred while processing your message. Please try again.",
        }
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for LanguageTag {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_LANGUAGES
            .iter()
            .copied()
            .find(|tag| tag.code() == s)
            .ok_or_else(|| UnknownLanguage(s.to_string()))
    }
}

/// Error returned when parsing an unsupported language code.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unsupported language code: {0:?}")]
pub struct UnknownLanguage(pub String);

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_and_locale_are_consistent() {
        for tag in ALL_LANGUAGES {
            let locale = tag.recognition_locale();
            // Every locale starts with the two-letter code ("ru" → "ru-RU").
            assert!(
                locale.starts_with(tag.code()),
                "{locale} does not start with {}",
                tag.code()
            );
        }
    }

    #[test]
    fn round_trips_through_from_str() {
        for tag in ALL_LANGUAGES {
            assert_eq!(tag.code().parse::<LanguageTag>().unwrap(), tag);
        }
    }

    #[test]
    fn unknown_code_is_rejected() {
        assert!("xx".parse::<LanguageTag>().is_err());
        assert!("".parse::<LanguageTag>().is_err());
    }

    #[test]
    fn every_language_has_greeting_and_fallback() {
        for tag in ALL_LANGUAGES {
            assert!(!tag.greeting().is_empty());
            assert!(!tag.fallback_reply().is_empty());
        }
    }

    #[test]
    fn serde_uses_lowercase_codes() {
        let json = serde_json::to_string(&LanguageTag::Ru).unwrap();
        assert_eq!(json, "\"ru\"");
        let back: LanguageTag = serde_json::from_str("\"kk\"").unwrap();
        assert_eq!(back, LanguageTag::Kk);
    }
}
