use serde::Serialize;
use todobot_core::{InteractionError, ItemId, ListFilter, TodoItem};

pub const LIST_COMPLETED_ID: &str = "list_completed";
pub const LIST_PENDING_ID: &str = "list_pending";

pub const PENDING_COLOR: u32 = 0x000370;
pub const COMPLETED_COLOR: u32 = 0x2E7D32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    /// Reply to a command with a new message.
    ChannelMessage,
    /// Edit the message that carried the clicked component.
    UpdateMessage,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ToggleButton {
    pub custom_id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
}

impl ToggleButton {
    pub fn new(custom_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self { custom_id: custom_id.into(), label: label.into(), emoji: None }
    }

    pub fn emoji(mut self, emoji: impl Into<String>) -> Self {
        self.emoji = Some(emoji.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Panel {
    pub title: String,
    pub description: String,
    pub color: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toggle: Option<ToggleButton>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InteractionResponse {
    pub kind: ResponseKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub panel: Option<Panel>,
    pub ephemeral: bool,
}

impl InteractionResponse {
    /// Text a transport can fall back to when it cannot render panels.
    pub fn fallback_text(&self) -> &str {
        match (&self.content, &self.panel) {
            (Some(content), _) => content.as_str(),
            (None, Some(panel)) => panel.description.as_str(),
            (None, None) => "",
        }
    }
}

pub struct ResponseBuilder {
    kind: ResponseKind,
    content: Option<String>,
    panel: Option<Panel>,
    ephemeral: bool,
}

impl ResponseBuilder {
    pub fn new(kind: ResponseKind) -> Self {
        Self { kind, content: None, panel: None, ephemeral: false }
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn panel<F>(mut self, title: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut PanelBuilder),
    {
        let mut builder = PanelBuilder::default();
        build(&mut builder);
        self.panel = Some(builder.build(title.into()));
        self
    }

    pub fn ephemeral(mut self) -> Self {
        self.ephemeral = true;
        self
    }

    pub fn build(self) -> InteractionResponse {
        InteractionResponse {
            kind: self.kind,
            content: self.content,
            panel: self.panel,
            ephemeral: self.ephemeral,
        }
    }
}

#[derive(Default)]
pub struct PanelBuilder {
    description: String,
    color: u32,
    toggle: Option<ToggleButton>,
}

impl PanelBuilder {
    pub fn description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = description.into();
        self
    }

    pub fn color(&mut self, color: u32) -> &mut Self {
        self.color = color;
        self
    }

    pub fn toggle(&mut self, toggle: ToggleButton) -> &mut Self {
        self.toggle = Some(toggle);
        self
    }

    fn build(self, title: String) -> Panel {
        Panel { title, description: self.description, color: self.color, toggle: self.toggle }
    }
}

pub fn pong_message() -> InteractionResponse {
    ResponseBuilder::new(ResponseKind::ChannelMessage).content("Pong!").build()
}

pub fn error_message(error: &InteractionError) -> InteractionResponse {
    ResponseBuilder::new(ResponseKind::ChannelMessage)
        .content(error.user_message())
        .ephemeral()
        .build()
}

pub fn todo_line(item: &TodoItem, pinned: Option<ItemId>) -> String {
    let line = if item.done {
        format!(":white_check_mark: ~~**{}**~~ (ID: {})", item.title, item.id)
    } else {
        format!(":black_small_square: **{}** (ID: {})", item.title, item.id)
    };

    if pinned == Some(item.id) {
        format!("__{line}__")
    } else {
        line
    }
}

/// Renders one filtered view of a caller's list. `items` must already be
/// filtered and in insertion order.
pub fn todo_list_message(
    kind: ResponseKind,
    filter: ListFilter,
    items: &[TodoItem],
    pinned: Option<ItemId>,
) -> InteractionResponse {
    let body = items.iter().map(|item| todo_line(item, pinned)).collect::<Vec<_>>().join("\n\n");
    let description = if body.is_empty() { empty_list_text(filter).to_owned() } else { body };

    ResponseBuilder::new(kind)
        .panel(list_title(filter), |panel| {
            panel.description(description).color(list_color(filter)).toggle(list_toggle(filter));
        })
        .ephemeral()
        .build()
}

fn list_title(filter: ListFilter) -> &'static str {
    match filter {
        ListFilter::Pending => "TO-DO",
        ListFilter::Completed => "TO-DO (completed)",
        ListFilter::All => "TO-DO (all)",
    }
}

fn list_color(filter: ListFilter) -> u32 {
    match filter {
        ListFilter::Pending => PENDING_COLOR,
        ListFilter::Completed | ListFilter::All => COMPLETED_COLOR,
    }
}

fn list_toggle(filter: ListFilter) -> ToggleButton {
    match filter {
        ListFilter::Pending => ToggleButton::new(LIST_COMPLETED_ID, "Show completed").emoji("✅"),
        ListFilter::Completed | ListFilter::All => {
            ToggleButton::new(LIST_PENDING_ID, "Show pending").emoji("⏳")
        }
    }
}

fn empty_list_text(filter: ListFilter) -> &'static str {
    match filter {
        ListFilter::Pending => "You have no pending TO-DO items. Create one with `/add`!",
        ListFilter::Completed => {
            "You have no completed TO-DO items. Create one with `/add` and finish it with `/done`!"
        }
        ListFilter::All => "You have no TO-DO items. Create one with `/add`!",
    }
}
