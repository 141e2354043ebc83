//! Per-user settings for AI providers and publishing defaults.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::channel::Platform;

/// Supported AI caption providers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AiProvider {
    Google,
    Openai,
    Anthropic,
    Grok,
    Deepseek,
    Openart,
}

impl AiProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            AiProvider::Google => "google",
            AiProvider::Openai => "openai",
            AiProvider::Anthropic => "anthropic",
            AiProvider::Grok => "grok",
            AiProvider::Deepseek => "deepseek",
            AiProvider::Openart => "openart",
        }
    }

    /// Guesses the provider an API key belongs to from its well-known
    /// prefix. `sk-ant-` must be checked before the generic `sk-`.
    pub fn detect_from_key(key: &str) -> Option<AiProvider> {
        let key = key.trim();
        if key.starts_with("AIza") {
            Some(AiProvider::Google)
        } else if key.starts_with("sk-ant-") {
            Some(AiProvider::Anthropic)
        } else if key.starts_with("sk-") {
            Some(AiProvider::Openai)
        } else if key.starts_with("xai-") {
            Some(AiProvider::Grok)
        } else if key.starts_with("ds-") {
            Some(AiProvider::Deepseek)
        } else {
            None
        }
    }
}

impl std::fmt::Display for AiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored settings for one user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSettings {
    /// API keys by provider. Keys are write-only through the API surface;
    /// reads redact them.
    #[serde(default)]
    pub api_keys: HashMap<AiProvider, String>,

    /// Platform preselected in new publish requests.
    pub default_platform: Platform,

    /// Provider used for caption generation.
    pub active_provider: AiProvider,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            api_keys: HashMap::new(),
            default_platform: Platform::Tiktok,
            active_provider: AiProvider::Google,
        }
    }
}

impl UserSettings {
    /// Returns the API key for the active provider, if one is stored.
    pub fn active_api_key(&self) -> Option<&str> {
        self.api_keys.get(&self.active_provider).map(String::as_str)
    }

    /// Applies a partial update. Provided API keys are merged per provider,
    /// last write wins; scalar fields replace when present.
    pub fn apply(&mut self, update: SettingsUpdate) {
        if let Some(keys) = update.api_keys {
            for (provider, key) in keys {
                self.api_keys.insert(provider, key);
            }
        }
        if let Some(platform) = update.default_platform {
            self.default_platform = platform;
        }
        if let Some(provider) = update.active_provider {
            self.active_provider = provider;
        }
    }
}

/// Partial settings update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_keys: Option<HashMap<AiProvider, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_platform: Option<Platform>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_provider: Option<AiProvider>,
}

impl SettingsUpdate {
    /// Names of the fields this update touches, for audit.
    pub fn changed_fields(&self) -> Vec<String> {
        let mut fields = Vec::new();
        if self.api_keys.is_some() {
            fields.push("api_keys".to_string());
        }
        if self.default_platform.is_some() {
            fields.push("default_platform".to_string());
        }
        if self.active_provider.is_some() {
            fields.push("active_provider".to_string());
        }
        fields
    }
}
