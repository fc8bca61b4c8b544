//! Configuration module for the voice kiosk.
//!
//! Provides `KioskConfig` (top-level settings), sub-configs for each
//! subsystem, `AppPaths` for cross-platform data directories, and TOML
//! persistence via `KioskConfig::load` / `KioskConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{ConversationConfig, KioskConfig, LlmConfig, TimingConfig, VoiceConfig};
