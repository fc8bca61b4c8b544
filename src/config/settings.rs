//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across
//! threads.  The timing defaults are the values the kiosk shipped with;
//! they are tuning parameters, not guaranteed-correct constants.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::language::LanguageTag;

use super::AppPaths;

// ---------------------------------------------------------------------------
// TimingConfig
// ---------------------------------------------------------------------------

/// Delays and thresholds that drive the turn loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Pause after the avatar stops speaking before listening re-arms, so
    /// trailing output audio is not captured as user speech.
    pub settling_delay_ms: u64,
    /// Back-off before re-entering listening after a retryable recognition
    /// error.
    pub retry_backoff_ms: u64,
    /// Delay before restarting recognition after it ended on its own or was
    /// force-stopped by the watchdog.
    pub restart_delay_ms: u64,
    /// How often the liveness watchdog runs.  Must be shorter than
    /// `staleness_threshold_secs`.
    pub watchdog_interval_secs: u64,
    /// Recognition is considered silently dead after this much time without
    /// any event.
    pub staleness_threshold_secs: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            settling_delay_ms: 700,
            retry_backoff_ms: 1000,
            restart_delay_ms: 500,
            watchdog_interval_secs: 30,
            staleness_threshold_secs: 60,
        }
    }
}

impl TimingConfig {
    pub fn settling_delay(&self) -> Duration {
        Duration::from_millis(self.settling_delay_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }

    pub fn watchdog_interval(&self) -> Duration {
        Duration::from_secs(self.watchdog_interval_secs)
    }

    pub fn staleness_threshold(&self) -> Duration {
        Duration::from_secs(self.staleness_threshold_secs)
    }
}

// ---------------------------------------------------------------------------
// VoiceConfig
// ---------------------------------------------------------------------------

/// Synthesis voice selection.
///
/// The avatar platform exposes voices by opaque id.  `overrides` maps a
/// language code to a dedicated voice; everything else uses
/// `default_voice`.  The shipped default carries the two-profile setup
/// (a Russian voice plus a catch-all); finer per-language selection is a
/// matter of adding entries here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceConfig {
    /// Voice id used when no override matches.
    pub default_voice: String,
    /// Per-language voice ids, keyed by ISO-639-1 code.
    pub overrides: HashMap<String, String>,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        let mut overrides = HashMap::new();
        overrides.insert("ru".to_string(), "37832e32d4f7475ab7a1cb0db8e5dd66".to_string());
        Self {
            default_voice: "42d00d4aac5441279d8536cd6b52c53c".to_string(),
            overrides,
        }
    }
}

impl VoiceConfig {
    /// Resolve the synthesis voice for `language`.
    pub fn voice_for(&self, language: LanguageTag) -> &str {
        self.overrides
            .get(language.code())
            .map(String::as_str)
            .unwrap_or(&self.default_voice)
    }
}

// ---------------------------------------------------------------------------
// LlmConfig
// ---------------------------------------------------------------------------

/// Settings for the language-model collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Whether the completion backend is configured at all.  When `false`
    /// the demo binary falls back to an offline echo collaborator.
    pub enabled: bool,
    /// Base URL of the OpenAI-compatible API endpoint.
    pub base_url: String,
    /// API key — `None` for local providers.
    pub api_key: Option<String>,
    /// Model identifier sent to the API.
    pub model: String,
    /// Sampling temperature (0.0 – 1.0).
    pub temperature: f32,
    /// Maximum tokens per reply — kiosk answers are short by design.
    pub max_tokens: u32,
    /// Maximum seconds to wait for a completion before timing out.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "https://api.openai.com".into(),
            api_key: None,
            model: "gpt-4o-mini".into(),
            temperature: 0.7,
            max_tokens: 256,
            timeout_secs: 15,
        }
    }
}

// ---------------------------------------------------------------------------
// ConversationConfig
// ---------------------------------------------------------------------------

/// Conversation-log sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// How many trailing turns accompany each completion request.
    pub context_turns: usize,
    /// Hard cap on stored turns per session.
    pub max_turns: usize,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            context_turns: 6,
            max_turns: 100,
        }
    }
}

// ---------------------------------------------------------------------------
// KioskConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use voice_kiosk::config::KioskConfig;
///
/// // Load (returns Default when file is missing)
/// let config = KioskConfig::load().unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KioskConfig {
    /// Language the session starts in, and the detector's final fallback.
    pub default_language: LanguageTag,
    /// Turn-loop delays and watchdog thresholds.
    pub timing: TimingConfig,
    /// Synthesis voice selection.
    pub voices: VoiceConfig,
    /// Language-model collaborator settings.
    pub llm: LlmConfig,
    /// Conversation-log sizing.
    pub conversation: ConversationConfig,
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            default_language: LanguageTag::Ru,
            timing: TimingConfig::default(),
            voices: VoiceConfig::default(),
            llm: LlmConfig::default(),
            conversation: ConversationConfig::default(),
        }
    }
}

impl KioskConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(KioskConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Verify that a default `KioskConfig` can be serialised to TOML and
    /// deserialised back without any data loss.
    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = KioskConfig::default();
        original.save_to(&path).expect("save");

        let loaded = KioskConfig::load_from(&path).expect("load");

        assert_eq!(original.default_language, loaded.default_language);

        assert_eq!(original.timing.settling_delay_ms, loaded.timing.settling_delay_ms);
        assert_eq!(original.timing.retry_backoff_ms, loaded.timing.retry_backoff_ms);
        assert_eq!(original.timing.restart_delay_ms, loaded.timing.restart_delay_ms);
        assert_eq!(
            original.timing.watchdog_interval_secs,
            loaded.timing.watchdog_interval_secs
        );
        assert_eq!(
            original.timing.staleness_threshold_secs,
            loaded.timing.staleness_threshold_secs
        );

        assert_eq!(original.voices.default_voice, loaded.voices.default_voice);
        assert_eq!(original.voices.overrides, loaded.voices.overrides);

        assert_eq!(original.llm.base_url, loaded.llm.base_url);
        assert_eq!(original.llm.api_key, loaded.llm.api_key);
        assert_eq!(original.llm.model, loaded.llm.model);
        assert_eq!(original.llm.timeout_secs, loaded.llm.timeout_secs);

        assert_eq!(original.conversation.context_turns, loaded.conversation.context_turns);
        assert_eq!(original.conversation.max_turns, loaded.conversation.max_turns);
    }

    /// `load_from` on a non-existent path must return `Default` without error.
    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = KioskConfig::load_from(&path).expect("should not error");
        let default = KioskConfig::default();

        assert_eq!(config.default_language, default.default_language);
        assert_eq!(config.llm.model, default.llm.model);
        assert_eq!(config.timing.settling_delay_ms, default.timing.settling_delay_ms);
    }

    /// The shipped timing defaults.
    #[test]
    fn default_timings() {
        let cfg = KioskConfig::default();

        assert_eq!(cfg.timing.settling_delay_ms, 700);
        assert_eq!(cfg.timing.retry_backoff_ms, 1000);
        assert_eq!(cfg.timing.restart_delay_ms, 500);
        assert_eq!(cfg.timing.watchdog_interval_secs, 30);
        assert_eq!(cfg.timing.staleness_threshold_secs, 60);
        // The check interval must be shorter than the staleness threshold or
        // a stalled session could go a full extra interval undetected.
        assert!(cfg.timing.watchdog_interval() < cfg.timing.staleness_threshold());
    }

    #[test]
    fn voice_overrides_resolve_per_language() {
        let cfg = VoiceConfig::default();

        // Russian has a dedicated profile; everything else is the catch-all.
        assert_eq!(cfg.voice_for(LanguageTag::Ru), "37832e32d4f7475ab7a1cb0db8e5dd66");
        assert_eq!(cfg.voice_for(LanguageTag::En), cfg.default_voice);
        assert_eq!(cfg.voice_for(LanguageTag::Kk), cfg.default_voice);
    }

    #[test]
    fn custom_voice_override_wins() {
        let mut cfg = VoiceConfig::default();
        cfg.overrides.insert("ja".into(), "voice-ja-1".into());
        assert_eq!(cfg.voice_for(LanguageTag::Ja), "voice-ja-1");
    }

    /// Verify that modified non-default values survive a round trip.
    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = KioskConfig::default();
        cfg.default_language = LanguageTag::En;
        cfg.timing.settling_delay_ms = 900;
        cfg.timing.staleness_threshold_secs = 45;
        cfg.llm.enabled = true;
        cfg.llm.base_url = "http://localhost:11434".into();
        cfg.llm.api_key = Some("sk-test".into());
        cfg.conversation.context_turns = 10;

        cfg.save_to(&path).expect("save");
        let loaded = KioskConfig::load_from(&path).expect("load");

        assert_eq!(loaded.default_language, LanguageTag::En);
        assert_eq!(loaded.timing.settling_delay_ms, 900);
        assert_eq!(loaded.timing.staleness_threshold_secs, 45);
        assert!(loaded.llm.enabled);
        assert_eq!(loaded.llm.base_url, "http://localhost:11434");
        assert_eq!(loaded.llm.api_key, Some("sk-test".into()));
        assert_eq!(loaded.conversation.context_turns, 10);
    }
}
