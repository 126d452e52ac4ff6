use std::{sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    blocks::InteractionResponse,
    commands::{command_definitions, CommandDefinition},
    events::{EventContext, EventDispatcher, HandlerResult, InteractionEnvelope},
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport failed to connect: {0}")]
    Connect(String),
    #[error("transport read failed: {0}")]
    Receive(String),
    #[error("transport response failed: {0}")]
    Respond(String),
    #[error("transport disconnect failed: {0}")]
    Disconnect(String),
    #[error("command registration request failed: {0}")]
    Registration(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("failed to register command `{command}`: {source}")]
    Register { command: String, source: TransportError },
    #[error("failed to remove command `{command}`: {source}")]
    Remove { command: String, source: TransportError },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self { max_retries: 5, base_delay_ms: 250, max_delay_ms: 5_000 }
    }
}

impl ReconnectPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(16);
        let multiplier = 1_u64 << exponent;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier).min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

#[async_trait]
pub trait GatewayTransport: Send + Sync {
    async fn connect(&self) -> Result<(), TransportError>;
    async fn next_interaction(&self) -> Result<Option<InteractionEnvelope>, TransportError>;
    async fn respond(
        &self,
        interaction_id: &str,
        response: &InteractionResponse,
    ) -> Result<(), TransportError>;
    async fn disconnect(&self) -> Result<(), TransportError>;
}

#[derive(Default)]
pub struct NoopGatewayTransport;

#[async_trait]
impl GatewayTransport for NoopGatewayTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn next_interaction(&self) -> Result<Option<InteractionEnvelope>, TransportError> {
        Ok(None)
    }

    async fn respond(
        &self,
        _interaction_id: &str,
        _response: &InteractionResponse,
    ) -> Result<(), TransportError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Where slash commands are declared: every guild the bot is installed in, or
/// a single guild.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum RegistrationScope {
    #[default]
    Global,
    Guild(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisteredCommand {
    pub id: String,
    pub name: String,
}

#[async_trait]
pub trait CommandRegistrar: Send + Sync {
    async fn register(
        &self,
        scope: &RegistrationScope,
        definition: &CommandDefinition,
    ) -> Result<RegisteredCommand, TransportError>;
    async fn remove(
        &self,
        scope: &RegistrationScope,
        command: &RegisteredCommand,
    ) -> Result<(), TransportError>;
}

#[derive(Default)]
pub struct NoopCommandRegistrar;

#[async_trait]
impl CommandRegistrar for NoopCommandRegistrar {
    async fn register(
        &self,
        _scope: &RegistrationScope,
        definition: &CommandDefinition,
    ) -> Result<RegisteredCommand, TransportError> {
        Ok(RegisteredCommand {
            id: format!("noop-{}", definition.name),
            name: definition.name.clone(),
        })
    }

    async fn remove(
        &self,
        _scope: &RegistrationScope,
        _command: &RegisteredCommand,
    ) -> Result<(), TransportError> {
        Ok(())
    }
}

pub struct GatewayRunner {
    transport: Arc<dyn GatewayTransport>,
    registrar: Arc<dyn CommandRegistrar>,
    dispatcher: EventDispatcher,
    reconnect_policy: ReconnectPolicy,
    scope: RegistrationScope,
    registered: Mutex<Vec<RegisteredCommand>>,
}

impl GatewayRunner {
    pub fn new(
        transport: Arc<dyn GatewayTransport>,
        registrar: Arc<dyn CommandRegistrar>,
        dispatcher: EventDispatcher,
        reconnect_policy: ReconnectPolicy,
    ) -> Self {
        Self {
            transport,
            registrar,
            dispatcher,
            reconnect_policy,
            scope: RegistrationScope::Global,
            registered: Mutex::new(Vec::new()),
        }
    }

    pub fn with_scope(mut self, scope: RegistrationScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn scope(&self) -> &RegistrationScope {
        &self.scope
    }

    pub async fn registered_commands(&self) -> Vec<RegisteredCommand> {
        self.registered.lock().await.clone()
    }

    /// Declares every command. A failed declaration withdraws the ones that
    /// already succeeded.
    pub async fn register_commands(&self) -> Result<usize, GatewayError> {
        let mut registered = self.registered.lock().await;

        for definition in command_definitions() {
            match self.registrar.register(&self.scope, &definition).await {
                Ok(command) => {
                    info!(
                        event_name = "gateway.command.registered",
                        command = %command.name,
                        command_id = %command.id,
                        scope = ?self.scope,
                        "registered slash command"
                    );
                    registered.push(command);
                }
                Err(source) => {
                    for command in registered.drain(..) {
                        if let Err(error) = self.registrar.remove(&self.scope, &command).await {
                            warn!(
                                command = %command.name,
                                error = %error,
                                "failed to roll back registered command"
                            );
                        }
                    }
                    return Err(GatewayError::Register { command: definition.name, source });
                }
            }
        }

        Ok(registered.len())
    }

    /// Removes every recorded command, continuing past failures. The first
    /// failure is reported once all removals were attempted.
    pub async fn remove_commands(&self) -> Result<usize, GatewayError> {
        let commands = std::mem::take(&mut *self.registered.lock().await);
        let mut removed = 0;
        let mut first_error = None;

        for command in commands {
            match self.registrar.remove(&self.scope, &command).await {
                Ok(()) => {
                    removed += 1;
                    info!(
                        event_name = "gateway.command.removed",
                        command = %command.name,
                        "removed slash command"
                    );
                }
                Err(source) => {
                    warn!(
                        command = %command.name,
                        error = %source,
                        "failed to remove slash command"
                    );
                    if first_error.is_none() {
                        first_error = Some(GatewayError::Remove { command: command.name, source });
                    }
                }
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(removed),
        }
    }

    pub async fn start(&self) -> Result<()> {
        for attempt in 0..=self.reconnect_policy.max_retries {
            match self.connect_and_pump(attempt).await {
                Ok(()) => return Ok(()),
                Err(transport_error) => {
                    warn!(
                        attempt,
                        max_retries = self.reconnect_policy.max_retries,
                        error = %transport_error,
                        "gateway transport failed"
                    );

                    if attempt >= self.reconnect_policy.max_retries {
                        warn!(
                            max_retries = self.reconnect_policy.max_retries,
                            "gateway retries exhausted; continuing process without crash"
                        );
                        return Ok(());
                    }

                    let delay = self.reconnect_policy.backoff(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Ok(())
    }

    async fn connect_and_pump(&self, attempt: u32) -> Result<(), TransportError> {
        info!(attempt, "opening gateway connection");
        self.transport.connect().await?;
        info!(attempt, "gateway connected");

        loop {
            let Some(envelope) = self.transport.next_interaction().await? else {
                info!(attempt, "gateway stream closed");
                self.transport.disconnect().await?;
                return Ok(());
            };

            info!(
                event_name = "ingress.gateway.interaction_received",
                interaction_id = %envelope.interaction_id,
                event_type = ?envelope.event.event_type(),
                interaction_name = envelope.event.name(),
                correlation_id = %envelope.interaction_id,
                "received interaction"
            );

            let context = EventContext { correlation_id: envelope.interaction_id.clone() };
            let response = match self.dispatcher.dispatch(&envelope, &context) {
                HandlerResult::Responded(response) => response,
                HandlerResult::Ignored => {
                    debug!(
                        correlation_id = %envelope.interaction_id,
                        "interaction ignored; no response sent"
                    );
                    continue;
                }
            };

            if let Err(error) = self.transport.respond(&envelope.interaction_id, &response).await {
                warn!(
                    event_name = "egress.gateway.response_sent",
                    correlation_id = %envelope.interaction_id,
                    error = %error,
                    "failed to send interaction response; continuing gateway loop"
                );
            } else {
                debug!(
                    event_name = "egress.gateway.response_sent",
                    correlation_id = %envelope.interaction_id,
                    kind = ?response.kind,
                    ephemeral = response.ephemeral,
                    "sent interaction response"
                );
            }
        }
    }
}
