use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use todobot_core::{InteractionError, OwnerId, TodoRepository};
use tracing::{debug, warn};

use crate::{
    blocks::InteractionResponse,
    commands::{
        command_definitions, CommandDefinition, CommandInvocation, CommandRouter, ListComponent,
        TodoCommand,
    },
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserRef {
    pub id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberContext {
    pub user: Option<UserRef>,
}

/// Who triggered an interaction. Guild interactions carry a member,
/// direct-message interactions carry a bare user.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallerContext {
    pub member: Option<MemberContext>,
    pub user: Option<UserRef>,
}

impl CallerContext {
    pub fn member(user_id: impl Into<String>) -> Self {
        Self {
            member: Some(MemberContext { user: Some(UserRef { id: user_id.into() }) }),
            user: None,
        }
    }

    pub fn user(user_id: impl Into<String>) -> Self {
        Self { member: None, user: Some(UserRef { id: user_id.into() }) }
    }

    pub fn resolve_owner(&self) -> Result<OwnerId, InteractionError> {
        self.member
            .as_ref()
            .and_then(|member| member.user.as_ref())
            .or(self.user.as_ref())
            .map(|user| OwnerId::new(user.id.clone()))
            .ok_or(InteractionError::IdentityUnresolvable)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InteractionEnvelope {
    pub interaction_id: String,
    pub caller: CallerContext,
    pub event: InteractionEvent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InteractionEvent {
    Command(CommandInvocation),
    Component(ComponentInteraction),
    Unsupported { kind: String },
}

impl InteractionEvent {
    pub fn event_type(&self) -> InteractionEventType {
        match self {
            Self::Command(_) => InteractionEventType::Command,
            Self::Component(_) => InteractionEventType::Component,
            Self::Unsupported { .. } => InteractionEventType::Unsupported,
        }
    }

    /// Command name or component custom id, for logging.
    pub fn name(&self) -> &str {
        match self {
            Self::Command(invocation) => &invocation.name,
            Self::Component(component) => &component.custom_id,
            Self::Unsupported { kind } => kind,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InteractionEventType {
    Command,
    Component,
    Unsupported,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentInteraction {
    pub custom_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    Responded(InteractionResponse),
    Ignored,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchSetupError {
    #[error("declared command `{0}` has no registered handler")]
    UnhandledCommand(String),
    #[error("command `{0}` is declared more than once")]
    DuplicateCommand(String),
}

/// Routes interactions to the command and component handlers.
///
/// The handler tables are fixed at construction: every declared command must
/// resolve to a handler variant, otherwise construction fails.
pub struct EventDispatcher {
    router: CommandRouter,
    commands: HashMap<String, TodoCommand>,
    components: HashMap<String, ListComponent>,
}

impl EventDispatcher {
    pub fn new(store: Arc<dyn TodoRepository>) -> Result<Self, DispatchSetupError> {
        Self::with_definitions(store, &command_definitions())
    }

    pub fn with_definitions(
        store: Arc<dyn TodoRepository>,
        definitions: &[CommandDefinition],
    ) -> Result<Self, DispatchSetupError> {
        let mut commands = HashMap::with_capacity(definitions.len());
        for definition in definitions {
            let handler = TodoCommand::from_name(&definition.name)
                .ok_or_else(|| DispatchSetupError::UnhandledCommand(definition.name.clone()))?;
            if commands.insert(definition.name.clone(), handler).is_some() {
                return Err(DispatchSetupError::DuplicateCommand(definition.name.clone()));
            }
        }

        let components = ListComponent::ALL
            .into_iter()
            .map(|component| (component.custom_id().to_owned(), component))
            .collect();

        Ok(Self { router: CommandRouter::new(store), commands, components })
    }

    pub fn dispatch(&self, envelope: &InteractionEnvelope, ctx: &EventContext) -> HandlerResult {
        match &envelope.event {
            InteractionEvent::Command(invocation) => {
                let Some(command) = self.commands.get(&invocation.name) else {
                    warn!(
                        correlation_id = %ctx.correlation_id,
                        command = %invocation.name,
                        "no handler registered for command"
                    );
                    return HandlerResult::Ignored;
                };

                debug!(
                    correlation_id = %ctx.correlation_id,
                    command = command.name(),
                    "dispatching command"
                );
                HandlerResult::Responded(self.router.route(*command, invocation, &envelope.caller))
            }
            InteractionEvent::Component(component) => {
                let Some(handler) = self.components.get(&component.custom_id) else {
                    warn!(
                        correlation_id = %ctx.correlation_id,
                        custom_id = %component.custom_id,
                        "no handler registered for component"
                    );
                    return HandlerResult::Ignored;
                };

                HandlerResult::Responded(self.router.route_component(*handler, &envelope.caller))
            }
            InteractionEvent::Unsupported { .. } => HandlerResult::Ignored,
        }
    }

    pub fn handler_count(&self) -> usize {
        self.commands.len() + self.components.len()
    }
}
