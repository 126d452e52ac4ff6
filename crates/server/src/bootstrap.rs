use std::sync::Arc;

use thiserror::Error;
use todobot_core::config::{AppConfig, ConfigError, LoadOptions};
use todobot_core::InMemoryTodoStore;
use todobot_discord::{
    events::{DispatchSetupError, EventDispatcher},
    gateway::{
        GatewayRunner, NoopCommandRegistrar, NoopGatewayTransport, ReconnectPolicy,
        RegistrationScope,
    },
};
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub store: Arc<InMemoryTodoStore>,
    pub runner: GatewayRunner,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("interaction dispatcher setup failed: {0}")]
    DispatchSetup(#[from] DispatchSetupError),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let store = Arc::new(InMemoryTodoStore::new());
    let dispatcher = EventDispatcher::new(store.clone())?;
    info!(
        event_name = "system.bootstrap.dispatcher_ready",
        correlation_id = "bootstrap",
        handlers = dispatcher.handler_count(),
        "interaction dispatcher initialized"
    );

    let runner = GatewayRunner::new(
        Arc::new(NoopGatewayTransport),
        Arc::new(NoopCommandRegistrar),
        dispatcher,
        ReconnectPolicy::default(),
    )
    .with_scope(registration_scope(&config));

    Ok(Application { config, store, runner })
}

fn registration_scope(config: &AppConfig) -> RegistrationScope {
    match &config.discord.guild_id {
        Some(guild_id) => RegistrationScope::Guild(guild_id.clone()),
        None => RegistrationScope::Global,
    }
}
