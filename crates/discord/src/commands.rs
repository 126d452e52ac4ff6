use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use todobot_core::{
    InteractionError, ItemId, ListFilter, OwnerId, RequiredOption, TodoOperation, TodoRepository,
};
use tracing::{debug, warn};

use crate::blocks::{self, InteractionResponse, ResponseKind, LIST_COMPLETED_ID, LIST_PENDING_ID};
use crate::events::CallerContext;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionKind {
    String,
    Integer,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OptionChoice {
    pub name: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OptionDefinition {
    pub name: String,
    pub description: String,
    pub kind: OptionKind,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_value: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<OptionChoice>,
}

impl OptionDefinition {
    fn new(kind: OptionKind, name: &str, description: &str) -> Self {
        Self {
            name: name.to_owned(),
            description: description.to_owned(),
            kind,
            required: false,
            min_value: None,
            choices: Vec::new(),
        }
    }

    pub fn string(name: &str, description: &str) -> Self {
        Self::new(OptionKind::String, name, description)
    }

    pub fn integer(name: &str, description: &str) -> Self {
        Self::new(OptionKind::Integer, name, description)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn min_value(mut self, min_value: i64) -> Self {
        self.min_value = Some(min_value);
        self
    }

    pub fn choice(mut self, name: &str, value: &str) -> Self {
        self.choices.push(OptionChoice { name: name.to_owned(), value: value.to_owned() });
        self
    }
}

/// Schema of one slash command as declared to the platform.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommandDefinition {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionDefinition>,
}

impl CommandDefinition {
    pub fn new(name: &str, description: &str) -> Self {
        Self { name: name.to_owned(), description: description.to_owned(), options: Vec::new() }
    }

    pub fn option(mut self, option: OptionDefinition) -> Self {
        self.options.push(option);
        self
    }
}

pub fn command_definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new("ping", "Replies with Pong!"),
        CommandDefinition::new("add", "Adds a new TO-DO item").option(
            OptionDefinition::string("title", "The title of the TO-DO item").required(),
        ),
        CommandDefinition::new("list", "Lists your TO-DO items").option(
            OptionDefinition::string("filter", "Which TO-DO items to show (default: pending)")
                .choice("All", "all")
                .choice("Pending", "pending")
                .choice("Completed", "completed"),
        ),
        CommandDefinition::new("done", "Marks a TO-DO item as done").option(
            OptionDefinition::integer("id", "The ID of the TO-DO item to mark as done")
                .required()
                .min_value(1),
        ),
        CommandDefinition::new("edit", "Changes the title of a TO-DO item")
            .option(
                OptionDefinition::integer("id", "The ID of the TO-DO item to edit")
                    .required()
                    .min_value(1),
            )
            .option(
                OptionDefinition::string("title", "The new title of the TO-DO item").required(),
            ),
        CommandDefinition::new("delete", "Deletes a TO-DO item").option(
            OptionDefinition::integer("id", "The ID of the TO-DO item to delete")
                .required()
                .min_value(1),
        ),
    ]
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OptionValue {
    String(String),
    Integer(i64),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandOption {
    pub name: String,
    pub value: OptionValue,
}

impl CommandOption {
    pub fn string(name: &str, value: impl Into<String>) -> Self {
        Self { name: name.to_owned(), value: OptionValue::String(value.into()) }
    }

    pub fn integer(name: &str, value: i64) -> Self {
        Self { name: name.to_owned(), value: OptionValue::Integer(value) }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandInvocation {
    pub name: String,
    pub options: Vec<CommandOption>,
}

impl CommandInvocation {
    pub fn new(name: &str, options: Vec<CommandOption>) -> Self {
        Self { name: name.to_owned(), options }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TodoCommand {
    Ping,
    Add,
    List,
    Done,
    Edit,
    Delete,
}

impl TodoCommand {
    pub const ALL: [Self; 6] =
        [Self::Ping, Self::Add, Self::List, Self::Done, Self::Edit, Self::Delete];

    pub fn name(self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Add => "add",
            Self::List => "list",
            Self::Done => "done",
            Self::Edit => "edit",
            Self::Delete => "delete",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|command| command.name() == name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ListComponent {
    ShowCompleted,
    ShowPending,
}

impl ListComponent {
    pub const ALL: [Self; 2] = [Self::ShowCompleted, Self::ShowPending];

    pub fn custom_id(self) -> &'static str {
        match self {
            Self::ShowCompleted => LIST_COMPLETED_ID,
            Self::ShowPending => LIST_PENDING_ID,
        }
    }

    pub fn filter(self) -> ListFilter {
        match self {
            Self::ShowCompleted => ListFilter::Completed,
            Self::ShowPending => ListFilter::Pending,
        }
    }
}

/// Name-indexed view over an invocation's options.
struct CommandArgs<'a> {
    options: HashMap<&'a str, &'a OptionValue>,
}

impl<'a> CommandArgs<'a> {
    fn new(invocation: &'a CommandInvocation) -> Self {
        Self {
            options: invocation
                .options
                .iter()
                .map(|option| (option.name.as_str(), &option.value))
                .collect(),
        }
    }

    fn required_string(&self, option: RequiredOption) -> Result<&'a str, InteractionError> {
        match self.options.get(option.name()).copied() {
            Some(OptionValue::String(value)) => Ok(value.as_str()),
            _ => Err(InteractionError::MissingRequiredOption(option)),
        }
    }

    fn required_item_id(&self, option: RequiredOption) -> Result<ItemId, InteractionError> {
        match self.options.get(option.name()).copied() {
            // Out-of-range values map to 0, which is never allocated.
            Some(OptionValue::Integer(value)) => Ok(ItemId(u32::try_from(*value).unwrap_or(0))),
            _ => Err(InteractionError::MissingRequiredOption(option)),
        }
    }

    fn list_filter(&self) -> ListFilter {
        let Some(OptionValue::String(raw)) = self.options.get("filter").copied() else {
            return ListFilter::default();
        };

        raw.parse::<ListFilter>().unwrap_or_else(|error| {
            warn!(error = %error, "ignoring unsupported list filter");
            ListFilter::default()
        })
    }
}

pub struct CommandRouter {
    store: Arc<dyn TodoRepository>,
}

impl CommandRouter {
    pub fn new(store: Arc<dyn TodoRepository>) -> Self {
        Self { store }
    }

    pub fn route(
        &self,
        command: TodoCommand,
        invocation: &CommandInvocation,
        caller: &CallerContext,
    ) -> InteractionResponse {
        match self.run(command, invocation, caller) {
            Ok(response) => response,
            Err(error) => {
                warn!(
                    event_name = "interaction.command.failed",
                    command = command.name(),
                    error = %error,
                    "command answered with an error message"
                );
                blocks::error_message(&error)
            }
        }
    }

    pub fn route_component(
        &self,
        component: ListComponent,
        caller: &CallerContext,
    ) -> InteractionResponse {
        match caller.resolve_owner() {
            Ok(owner) => {
                self.render(&owner, ResponseKind::UpdateMessage, component.filter(), None)
            }
            Err(error) => {
                warn!(
                    event_name = "interaction.component.failed",
                    custom_id = component.custom_id(),
                    error = %error,
                    "component answered with an error message"
                );
                blocks::error_message(&error)
            }
        }
    }

    fn run(
        &self,
        command: TodoCommand,
        invocation: &CommandInvocation,
        caller: &CallerContext,
    ) -> Result<InteractionResponse, InteractionError> {
        let args = CommandArgs::new(invocation);

        match command {
            TodoCommand::Ping => Ok(blocks::pong_message()),
            TodoCommand::Add => {
                let title = args.required_string(RequiredOption::Title)?;
                let owner = caller.resolve_owner()?;
                let item = self
                    .store
                    .add(&owner, title)
                    .map_err(|error| InteractionError::from_store(TodoOperation::Add, error))?;
                debug!(owner_id = %owner, item_id = %item.id, "to-do item added");
                Ok(self.pending_view(&owner, item.id))
            }
            TodoCommand::List => {
                let filter = args.list_filter();
                let owner = caller.resolve_owner()?;
                Ok(self.render(&owner, ResponseKind::ChannelMessage, filter, None))
            }
            TodoCommand::Done => {
                let id = args.required_item_id(RequiredOption::Id)?;
                let owner = caller.resolve_owner()?;
                let item = self
                    .store
                    .mark_done(&owner, id)
                    .map_err(|error| InteractionError::from_store(TodoOperation::MarkDone, error))?;
                debug!(owner_id = %owner, item_id = %item.id, "to-do item marked done");
                Ok(self.pending_view(&owner, item.id))
            }
            TodoCommand::Edit => {
                let id = args.required_item_id(RequiredOption::Id)?;
                let title = args.required_string(RequiredOption::Title)?;
                let owner = caller.resolve_owner()?;
                let item = self
                    .store
                    .edit(&owner, id, title)
                    .map_err(|error| InteractionError::from_store(TodoOperation::Edit, error))?;
                debug!(owner_id = %owner, item_id = %item.id, "to-do item edited");
                Ok(self.pending_view(&owner, item.id))
            }
            TodoCommand::Delete => {
                let id = args.required_item_id(RequiredOption::Id)?;
                let owner = caller.resolve_owner()?;
                let removed = self
                    .store
                    .delete(&owner, id)
                    .map_err(|error| InteractionError::from_store(TodoOperation::Delete, error))?;
                debug!(owner_id = %owner, item_id = %removed.id, "to-do item deleted");
                let filter = if removed.done { ListFilter::Completed } else { ListFilter::Pending };
                Ok(self.render(&owner, ResponseKind::ChannelMessage, filter, None))
            }
        }
    }

    fn pending_view(&self, owner: &OwnerId, pinned: ItemId) -> InteractionResponse {
        self.render(owner, ResponseKind::ChannelMessage, ListFilter::Pending, Some(pinned))
    }

    fn render(
        &self,
        owner: &OwnerId,
        kind: ResponseKind,
        filter: ListFilter,
        pinned: Option<ItemId>,
    ) -> InteractionResponse {
        let items = self.store.list_filtered(owner, filter, pinned);
        blocks::todo_list_message(kind, filter, &items, pinned)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use todobot_core::{
        InMemoryTodoStore, ItemId, ListFilter, OwnerId, StoreError, TodoItem, TodoRepository,
    };

    use super::{
        command_definitions, CommandInvocation, CommandOption, CommandRouter, ListComponent,
        TodoCommand,
    };
    use crate::blocks::{InteractionResponse, ResponseKind, LIST_COMPLETED_ID, LIST_PENDING_ID};
    use crate::events::CallerContext;

    fn router() -> (CommandRouter, Arc<InMemoryTodoStore>) {
        let store = Arc::new(InMemoryTodoStore::new());
        (CommandRouter::new(store.clone()), store)
    }

    fn invoke(
        router: &CommandRouter,
        command: TodoCommand,
        options: Vec<CommandOption>,
    ) -> InteractionResponse {
        router.route(
            command,
            &CommandInvocation::new(command.name(), options),
            &CallerContext::member("U1"),
        )
    }

    fn description(response: &InteractionResponse) -> &str {
        response.panel.as_ref().map(|panel| panel.description.as_str()).unwrap_or_default()
    }

    #[test]
    fn every_declared_command_has_a_handler_variant() {
        let declared = command_definitions();
        assert_eq!(declared.len(), TodoCommand::ALL.len());
        for definition in &declared {
            assert!(TodoCommand::from_name(&definition.name).is_some(), "{}", definition.name);
        }
    }

    #[test]
    fn list_filter_option_declares_choices() {
        let definitions = command_definitions();
        let list = definitions.iter().find(|definition| definition.name == "list").expect("list");
        let choices =
            list.options[0].choices.iter().map(|choice| choice.value.as_str()).collect::<Vec<_>>();
        assert_eq!(choices, vec!["all", "pending", "completed"]);
        assert!(!list.options[0].required);
    }

    #[test]
    fn ping_replies_publicly() {
        let (router, _) = router();
        let response = invoke(&router, TodoCommand::Ping, vec![]);
        assert_eq!(response.content.as_deref(), Some("Pong!"));
        assert!(!response.ephemeral);
    }

    #[test]
    fn add_renders_pending_view_with_new_item_highlighted() {
        let (router, store) = router();
        invoke(&router, TodoCommand::Add, vec![CommandOption::string("title", "Buy milk")]);
        let response =
            invoke(&router, TodoCommand::Add, vec![CommandOption::string("title", "Buy eggs")]);

        assert_eq!(
            description(&response),
            ":black_small_square: **Buy milk** (ID: 1)\n\n__:black_small_square: **Buy eggs** (ID: 2)__"
        );
        assert_eq!(response.kind, ResponseKind::ChannelMessage);
        assert!(response.ephemeral);
        assert_eq!(store.list(&OwnerId::new("U1")).len(), 2);
    }

    #[test]
    fn add_without_title_is_rejected_before_touching_the_store() {
        let (router, store) = router();
        let response = invoke(&router, TodoCommand::Add, vec![]);

        assert_eq!(response.content.as_deref(), Some("Error: Title option is required."));
        assert_eq!(store.owner_count(), 0);
    }

    #[test]
    fn done_keeps_completed_item_visible_in_pending_view() {
        let (router, _) = router();
        invoke(&router, TodoCommand::Add, vec![CommandOption::string("title", "Write spec")]);
        invoke(&router, TodoCommand::Add, vec![CommandOption::string("title", "Review spec")]);

        let response = invoke(&router, TodoCommand::Done, vec![CommandOption::integer("id", 1)]);
        assert_eq!(
            description(&response),
            "__:white_check_mark: ~~**Write spec**~~ (ID: 1)__\n\n:black_small_square: **Review spec** (ID: 2)"
        );

        let pending = invoke(&router, TodoCommand::List, vec![]);
        assert_eq!(description(&pending), ":black_small_square: **Review spec** (ID: 2)");
    }

    #[test]
    fn done_reports_store_reason_inline() {
        let (router, _) = router();
        let empty = invoke(&router, TodoCommand::Done, vec![CommandOption::integer("id", 1)]);
        assert_eq!(
            empty.content.as_deref(),
            Some("Error marking TO-DO item as done: no to-do items found, create one with `/add`")
        );

        invoke(&router, TodoCommand::Add, vec![CommandOption::string("title", "a")]);
        let unknown = invoke(&router, TodoCommand::Done, vec![CommandOption::integer("id", 5)]);
        assert_eq!(
            unknown.content.as_deref(),
            Some("Error marking TO-DO item as done: TO-DO item with (ID: 5) does not exist")
        );
        assert!(unknown.ephemeral);
    }

    #[test]
    fn done_and_delete_without_id_are_rejected_before_touching_the_store() {
        let (router, store) = router();
        invoke(&router, TodoCommand::Add, vec![CommandOption::string("title", "Buy milk")]);
        let before = store.list(&OwnerId::new("U1"));

        for command in [TodoCommand::Done, TodoCommand::Delete] {
            let response = invoke(&router, command, vec![]);
            assert_eq!(response.content.as_deref(), Some("Error: ID option is required."));
            assert!(response.ephemeral);
            assert!(response.panel.is_none());
        }

        let wrong_type =
            invoke(&router, TodoCommand::Delete, vec![CommandOption::string("id", "1")]);
        assert_eq!(wrong_type.content.as_deref(), Some("Error: ID option is required."));
        assert_eq!(store.list(&OwnerId::new("U1")), before);
    }

    #[test]
    fn done_with_negative_id_is_not_found() {
        let (router, _) = router();
        invoke(&router, TodoCommand::Add, vec![CommandOption::string("title", "a")]);
        let response = invoke(&router, TodoCommand::Done, vec![CommandOption::integer("id", -1)]);
        assert!(response.content.as_deref().is_some_and(|text| text.contains("does not exist")));
    }

    #[test]
    fn edit_requires_both_options_and_pins_the_item() {
        let (router, store) = router();
        invoke(&router, TodoCommand::Add, vec![CommandOption::string("title", "Buy milk")]);

        let missing = invoke(&router, TodoCommand::Edit, vec![CommandOption::integer("id", 1)]);
        assert_eq!(missing.content.as_deref(), Some("Error: Title option is required."));

        let response = invoke(
            &router,
            TodoCommand::Edit,
            vec![CommandOption::integer("id", 1), CommandOption::string("title", "Buy oat milk")],
        );
        assert_eq!(description(&response), "__:black_small_square: **Buy oat milk** (ID: 1)__");
        assert_eq!(store.list(&OwnerId::new("U1"))[0].title, "Buy oat milk");

        let failed = invoke(
            &router,
            TodoCommand::Edit,
            vec![CommandOption::integer("id", 9), CommandOption::string("title", "x")],
        );
        assert_eq!(failed.content.as_deref(), Some("Error editing TO-DO item. Please try again."));
    }

    #[test]
    fn delete_redirects_to_view_matching_prior_state() {
        let (router, _) = router();
        for title in ["a", "b"] {
            invoke(&router, TodoCommand::Add, vec![CommandOption::string("title", title)]);
        }
        invoke(&router, TodoCommand::Done, vec![CommandOption::integer("id", 1)]);

        let completed = invoke(&router, TodoCommand::Delete, vec![CommandOption::integer("id", 1)]);
        let panel = completed.panel.expect("panel");
        assert_eq!(panel.title, "TO-DO (completed)");
        assert_eq!(panel.toggle.map(|toggle| toggle.custom_id).as_deref(), Some(LIST_PENDING_ID));

        let pending = invoke(&router, TodoCommand::Delete, vec![CommandOption::integer("id", 2)]);
        let panel = pending.panel.expect("panel");
        assert_eq!(panel.title, "TO-DO");
        assert!(panel.description.contains("no pending TO-DO items"));

        let missing = invoke(&router, TodoCommand::Delete, vec![CommandOption::integer("id", 2)]);
        assert_eq!(missing.content.as_deref(), Some("Error deleting TO-DO item. Please try again."));
    }

    #[test]
    fn list_honors_filter_choice_and_falls_back_to_pending() {
        let (router, _) = router();
        for title in ["a", "b"] {
            invoke(&router, TodoCommand::Add, vec![CommandOption::string("title", title)]);
        }
        invoke(&router, TodoCommand::Done, vec![CommandOption::integer("id", 2)]);

        let all = invoke(&router, TodoCommand::List, vec![CommandOption::string("filter", "all")]);
        assert_eq!(all.panel.as_ref().map(|panel| panel.title.as_str()), Some("TO-DO (all)"));
        assert!(description(&all).contains("(ID: 1)") && description(&all).contains("(ID: 2)"));

        let odd = invoke(&router, TodoCommand::List, vec![CommandOption::string("filter", "soon")]);
        assert_eq!(description(&odd), ":black_small_square: **a** (ID: 1)");
        assert_eq!(
            odd.panel.and_then(|panel| panel.toggle).map(|toggle| toggle.custom_id).as_deref(),
            Some(LIST_COMPLETED_ID)
        );
    }

    #[test]
    fn commands_without_identity_are_rejected() {
        let (router, store) = router();
        let response = router.route(
            TodoCommand::Add,
            &CommandInvocation::new("add", vec![CommandOption::string("title", "a")]),
            &CallerContext::default(),
        );

        assert_eq!(response.content.as_deref(), Some("Error: Unable to retrieve user information."));
        assert_eq!(store.owner_count(), 0);
    }

    #[test]
    fn components_rerender_without_mutating() {
        let (router, store) = router();
        invoke(&router, TodoCommand::Add, vec![CommandOption::string("title", "a")]);
        invoke(&router, TodoCommand::Done, vec![CommandOption::integer("id", 1)]);
        let before = store.list(&OwnerId::new("U1"));

        let response =
            router.route_component(ListComponent::ShowCompleted, &CallerContext::user("U1"));
        assert_eq!(response.kind, ResponseKind::UpdateMessage);
        assert_eq!(description(&response), ":white_check_mark: ~~**a**~~ (ID: 1)");
        assert_eq!(store.list(&OwnerId::new("U1")), before);
    }

    #[test]
    fn failing_store_maps_to_generic_add_failure() {
        #[derive(Default)]
        struct UnavailableStore {
            calls: Mutex<Vec<&'static str>>,
        }

        impl TodoRepository for UnavailableStore {
            fn add(&self, _owner: &OwnerId, _title: &str) -> Result<TodoItem, StoreError> {
                self.calls.lock().expect("lock").push("add");
                Err(StoreError::Unavailable("read-only replica".to_owned()))
            }

            fn list(&self, _owner: &OwnerId) -> Vec<TodoItem> {
                Vec::new()
            }

            fn list_filtered(
                &self,
                _owner: &OwnerId,
                _filter: ListFilter,
                _pinned: Option<ItemId>,
            ) -> Vec<TodoItem> {
                self.calls.lock().expect("lock").push("list_filtered");
                Vec::new()
            }

            fn mark_done(&self, _owner: &OwnerId, id: ItemId) -> Result<TodoItem, StoreError> {
                Err(StoreError::ItemNotFound { id, owner_has_items: false })
            }

            fn edit(
                &self,
                _owner: &OwnerId,
                id: ItemId,
                _title: &str,
            ) -> Result<TodoItem, StoreError> {
                Err(StoreError::ItemNotFound { id, owner_has_items: false })
            }

            fn delete(&self, _owner: &OwnerId, id: ItemId) -> Result<TodoItem, StoreError> {
                Err(StoreError::ItemNotFound { id, owner_has_items: false })
            }
        }

        let store = Arc::new(UnavailableStore::default());
        let router = CommandRouter::new(store.clone());
        let response =
            invoke(&router, TodoCommand::Add, vec![CommandOption::string("title", "a")]);

        assert_eq!(response.content.as_deref(), Some("Error adding TO-DO item. Please try again."));
        assert_eq!(&*store.calls.lock().expect("lock"), &["add"]);
    }
}
