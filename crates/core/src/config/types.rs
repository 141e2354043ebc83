use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::orchestrator::OrchestratorConfig;
use crate::settings::AiProvider;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub captioner: CaptionerSection,
    #[serde(default)]
    pub audit: AuditConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8080
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub method: AuthMethod,
    /// Required when method = "api_key"
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    None,
    ApiKey,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("contentflow.db")
}

/// Caption generation configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CaptionerSection {
    /// Fallback provider when a user has no active provider configured
    #[serde(default = "default_provider")]
    pub provider: AiProvider,
    /// Model name (e.g. "gemini-2.5-flash")
    #[serde(default = "default_model")]
    pub model: String,
    /// Service-level API key, used when the user has none stored
    #[serde(default)]
    pub api_key: Option<String>,
    /// Base URL of a local Ollama server. When set, callers without a
    /// stored key use local inference, which needs no API key.
    #[serde(default)]
    pub ollama_api_base: Option<String>,
    /// Attempts per caption request, counting the first
    #[serde(default = "default_caption_attempts")]
    pub max_attempts: u32,
    /// Base delay between retries in milliseconds, doubled each attempt
    #[serde(default = "default_caption_backoff")]
    pub retry_backoff_ms: u64,
    /// Per-attempt timeout in seconds
    #[serde(default = "default_caption_timeout")]
    pub timeout_secs: u64,
    /// Maximum tokens for the generated caption
    #[serde(default = "default_caption_tokens")]
    pub max_tokens: u32,
}

impl Default for CaptionerSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key: None,
            ollama_api_base: None,
            max_attempts: default_caption_attempts(),
            retry_backoff_ms: default_caption_backoff(),
            timeout_secs: default_caption_timeout(),
            max_tokens: default_caption_tokens(),
        }
    }
}

fn default_provider() -> AiProvider {
    AiProvider::Google
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_caption_attempts() -> u32 {
    2
}

fn default_caption_backoff() -> u64 {
    500
}

fn default_caption_timeout() -> u64 {
    30
}

fn default_caption_tokens() -> u32 {
    512
}

/// Audit pipeline configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuditConfig {
    /// Size of the event channel buffer
    #[serde(default = "default_audit_buffer")]
    pub buffer_size: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_audit_buffer(),
        }
    }
}

fn default_audit_buffer() -> usize {
    256
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub auth: SanitizedAuthConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub orchestrator: OrchestratorConfig,
    pub captioner: SanitizedCaptionerConfig,
    pub audit: AuditConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAuthConfig {
    pub method: String,
    pub api_key_configured: bool,
}

/// Sanitized captioner config (API key redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedCaptionerConfig {
    pub provider: String,
    pub model: String,
    pub api_key_configured: bool,
    pub max_attempts: u32,
    pub timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            auth: SanitizedAuthConfig {
                method: match config.auth.method {
                    AuthMethod::None => "none".to_string(),
                    AuthMethod::ApiKey => "api_key".to_string(),
                },
                api_key_configured: config
                    .auth
                    .api_key
                    .as_ref()
                    .is_some_and(|k| !k.is_empty()),
            },
            server: config.server.clone(),
            database: config.database.clone(),
            orchestrator: config.orchestrator.clone(),
            captioner: SanitizedCaptionerConfig {
                provider: config.captioner.provider.to_string(),
                model: config.captioner.model.clone(),
                api_key_configured: config
                    .captioner
                    .api_key
                    .as_ref()
                    .is_some_and(|k| !k.is_empty()),
                max_attempts: config.captioner.max_attempts,
                timeout_secs: config.captioner.timeout_secs,
            },
            audit: config.audit.clone(),
        }
    }
}
