//! System prompts for the kiosk assistant persona.
//!
//! Dedicated wording exists for Russian; every other language receives the
//! English instructions plus an explicit reply-language directive.  Prompt
//! quality is a collaborator concern — these are deliberately short.

use crate::language::LanguageTag;

const SYSTEM_PROMPT_RU: &str = "\
Вы — виртуальный ассистент информационного киоска. Вы помогаете посетителям \
голосом, поэтому отвечайте так, как говорят вслух.

ПРАВИЛА ОБЩЕНИЯ:
- Отвечайте на том языке, на котором к вам обратились.
- Обращайтесь к посетителям на «вы», будьте тёплым и деловым.
- Не используйте нумерованные списки; перечисляйте факты естественным текстом.
- Будьте кратким — обычно достаточно 2-3 предложений.";

const SYSTEM_PROMPT_EN: &str = "\
You are the virtual assistant of an information kiosk. Your replies are \
spoken aloud by an avatar, so write the way people talk.

COMMUNICATION GUIDELINES:
- Reply in the same language used by the visitor.
- Be respectful, warm and concise — two or three sentences are usually enough.
- Avoid numbered lists; weave facts into natural sentences.";

/// Build the system message for a completion request in `language`.
pub fn system_prompt(language: LanguageTag) -> String {
    let base = match language {
        LanguageTag::Ru => SYSTEM_PROMPT_RU,
        _ => SYSTEM_PROMPT_EN,
    };
    format!("{base}\nReply in {}.", language.english_name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn russian_gets_dedicated_prompt() {
        let prompt = system_prompt(LanguageTag::Ru);
        assert!(prompt.contains("виртуальный ассистент"));
        assert!(prompt.ends_with("Reply in Russian."));
    }

    #[test]
    fn other_languages_get_english_prompt_with_directive() {
        let prompt = system_prompt(LanguageTag::Es);
        assert!(prompt.contains("information kiosk"));
        assert!(prompt.ends_with("Reply in Spanish."));
    }
}
