use std::sync::Arc;

use contentflow_core::{
    AuditHandle, AuditStore, Authenticator, ChannelRegistry, Config, PublishOrchestrator,
    SanitizedConfig, SettingsStore,
};

/// Shared application state
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    audit: AuditHandle,
    audit_store: Arc<dyn AuditStore>,
    registry: Arc<dyn ChannelRegistry>,
    settings: Arc<dyn SettingsStore>,
    orchestrator: Arc<PublishOrchestrator>,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        audit: AuditHandle,
        audit_store: Arc<dyn AuditStore>,
        registry: Arc<dyn ChannelRegistry>,
        settings: Arc<dyn SettingsStore>,
        orchestrator: Arc<PublishOrchestrator>,
    ) -> Self {
        Self {
            config,
            authenticator,
            audit,
            audit_store,
            registry,
            settings,
            orchestrator,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn audit(&self) -> &AuditHandle {
        &self.audit
    }

    pub fn audit_store(&self) -> &dyn AuditStore {
        self.audit_store.as_ref()
    }

    pub fn registry(&self) -> &dyn ChannelRegistry {
        self.registry.as_ref()
    }

    pub fn settings(&self) -> &dyn SettingsStore {
        self.settings.as_ref()
    }

    pub fn orchestrator(&self) -> &PublishOrchestrator {
        &self.orchestrator
    }
}
