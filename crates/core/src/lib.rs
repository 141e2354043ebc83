pub mod audit;
pub mod auth;
pub mod captioner;
pub mod channel;
pub mod config;
pub mod metrics;
pub mod orchestrator;
pub mod publish;
pub mod settings;
pub mod testing;
pub mod transport;

pub use audit::{
    create_audit_system, AuditError, AuditEvent, AuditFilter, AuditHandle, AuditRecord, AuditStore,
    AuditWriter, SqliteAuditStore,
};
pub use auth::{
    create_authenticator, ApiKeyAuthenticator, AuthError, AuthRequest, Authenticator, Identity,
    NoneAuthenticator,
};
pub use captioner::{
    build_client, CaptionGenerator, CaptionRequest, CaptionerConfig, GeneratedCaption, LlmClient,
    LlmError, LlmUsage, OllamaClient,
};
pub use channel::{
    Channel, ChannelError, ChannelFilter, ChannelRegistry, ConnectionStatus, Platform,
    SqliteChannelRegistry,
};
pub use config::{
    load_config, load_config_from_str, validate_config, AuditConfig, AuthConfig, AuthMethod,
    CaptionerSection, Config, ConfigError, DatabaseConfig, SanitizedConfig, ServerConfig,
};
pub use orchestrator::{
    OrchestratorConfig, OrchestratorError, OrchestratorStatus, PublishOrchestrator,
};
pub use publish::{
    Asset, MediaKind, PublishJob, PublishRequest, PublishStatus, ScheduleMode, ValidationError,
};
pub use settings::{
    AiProvider, SettingsError, SettingsStore, SettingsUpdate, SqliteSettingsStore, UserSettings,
};
pub use transport::{PublishTransport, SimulatedTransport, TransportError};
