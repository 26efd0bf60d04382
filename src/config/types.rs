use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

use crate::types::LanguageCode;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "watcher.pollIntervalMs")
    pub field_path: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// i18n エンジン全体の設定
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineSettings {
    /// 翻訳リソースのディレクトリ（ワークスペースルートからの相対）
    pub locale_dir: String,

    /// 翻訳リソースのファイルパターン
    pub file_pattern: String,

    /// 言語設定を保持するスロット名（ワークスペースルート直下のファイル名）
    pub preference_slot: String,

    /// デフォルト言語（フォールバック先）
    pub default_language: LanguageCode,

    pub watcher: WatcherConfig,
    pub broadcast: BroadcastConfig,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WatcherConfig {
    /// スロット監視のポーリング間隔（ミリ秒）
    pub poll_interval_ms: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self { poll_interval_ms: 500 }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BroadcastConfig {
    /// 配信チャネルのバッファ容量
    pub capacity: usize,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self { capacity: 16 }
    }
}

impl EngineSettings {
    /// # Errors
    /// - 必須フィールドが空
    /// - 不正な glob パターン
    /// - 不正な監視間隔・容量
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.locale_dir.is_empty() {
            errors.push(ValidationError::new(
                "localeDir",
                "The directory cannot be empty. Example: \"i18n\"",
            ));
        }

        if self.preference_slot.is_empty() {
            errors.push(ValidationError::new(
                "preferenceSlot",
                "The slot name cannot be empty. Example: \"site-lang\"",
            ));
        }

        if self.file_pattern.is_empty() {
            errors.push(ValidationError::new(
                "filePattern",
                "The pattern cannot be empty. Example: \"*.json\"",
            ));
        } else if let Err(e) = globset::Glob::new(&self.file_pattern) {
            errors.push(ValidationError::new(
                "filePattern",
                format!("Invalid glob pattern '{}': {e}", self.file_pattern),
            ));
        }

        if self.watcher.poll_interval_ms == 0 {
            errors.push(ValidationError::new(
                "watcher.pollIntervalMs",
                "The interval must be greater than zero",
            ));
        }

        if self.broadcast.capacity == 0 {
            errors.push(ValidationError::new(
                "broadcast.capacity",
                "The capacity must be greater than zero",
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            locale_dir: "i18n".to_string(),
            file_pattern: "*.json".to_string(),
            preference_slot: "site-lang".to_string(),
            default_language: LanguageCode::En,
            watcher: WatcherConfig::default(),
            broadcast: BroadcastConfig::default(),
        }
    }
}
