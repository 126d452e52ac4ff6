use thiserror::Error;

use crate::domain::todo::ItemId;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{}", not_found_message(.id, .owner_has_items))]
    ItemNotFound { id: ItemId, owner_has_items: bool },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

fn not_found_message(id: &ItemId, owner_has_items: &bool) -> String {
    if *owner_has_items {
        format!("TO-DO item with (ID: {id}) does not exist")
    } else {
        "no to-do items found, create one with `/add`".to_owned()
    }
}

/// Which option a command was missing. Carries the label shown to the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequiredOption {
    Title,
    Id,
}

impl RequiredOption {
    pub fn name(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Id => "id",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Id => "ID",
        }
    }
}

/// The operation an interaction was attempting, used to phrase failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TodoOperation {
    Add,
    MarkDone,
    Edit,
    Delete,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InteractionError {
    #[error("missing required option `{0:?}`")]
    MissingRequiredOption(RequiredOption),
    #[error("interaction carries neither a member nor a user context")]
    IdentityUnresolvable,
    #[error("{operation:?} failed: {source}")]
    ItemNotFound { operation: TodoOperation, source: StoreError },
    #[error("{operation:?} failed: {message}")]
    StoreOperationFailed { operation: TodoOperation, message: String },
}

impl InteractionError {
    pub fn from_store(operation: TodoOperation, error: StoreError) -> Self {
        match error {
            StoreError::ItemNotFound { .. } => Self::ItemNotFound { operation, source: error },
            StoreError::Unavailable(message) => Self::StoreOperationFailed { operation, message },
        }
    }

    /// Text shown to the caller. `done` surfaces the store's reason inline,
    /// every other operation answers with a generic retry hint.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingRequiredOption(option) => {
                format!("Error: {} option is required.", option.label())
            }
            Self::IdentityUnresolvable => "Error: Unable to retrieve user information.".to_owned(),
            Self::ItemNotFound { operation: TodoOperation::MarkDone, source } => {
                format!("Error marking TO-DO item as done: {source}")
            }
            Self::ItemNotFound { operation, .. } | Self::StoreOperationFailed { operation, .. } => {
                generic_failure(*operation).to_owned()
            }
        }
    }
}

fn generic_failure(operation: TodoOperation) -> &'static str {
    match operation {
        TodoOperation::Add => "Error adding TO-DO item. Please try again.",
        TodoOperation::MarkDone => "Error marking TO-DO item as done. Please try again.",
        TodoOperation::Edit => "Error editing TO-DO item. Please try again.",
        TodoOperation::Delete => "Error deleting TO-DO item. Please try again.",
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::todo::ItemId;
    use crate::errors::{InteractionError, RequiredOption, StoreError, TodoOperation};

    #[test]
    fn store_error_message_distinguishes_empty_owner_from_unknown_id() {
        let empty = StoreError::ItemNotFound { id: ItemId(4), owner_has_items: false };
        let missing = StoreError::ItemNotFound { id: ItemId(4), owner_has_items: true };

        assert_eq!(empty.to_string(), "no to-do items found, create one with `/add`");
        assert_eq!(missing.to_string(), "TO-DO item with (ID: 4) does not exist");
    }

    #[test]
    fn mark_done_failures_surface_store_reason() {
        let error = InteractionError::from_store(
            TodoOperation::MarkDone,
            StoreError::ItemNotFound { id: ItemId(9), owner_has_items: true },
        );

        assert_eq!(
            error.user_message(),
            "Error marking TO-DO item as done: TO-DO item with (ID: 9) does not exist"
        );
    }

    #[test]
    fn edit_and_delete_failures_use_generic_messages() {
        let not_found = StoreError::ItemNotFound { id: ItemId(1), owner_has_items: false };

        let edit = InteractionError::from_store(TodoOperation::Edit, not_found.clone());
        let delete = InteractionError::from_store(TodoOperation::Delete, not_found);

        assert!(matches!(edit, InteractionError::ItemNotFound { .. }));
        assert_eq!(edit.user_message(), "Error editing TO-DO item. Please try again.");
        assert_eq!(delete.user_message(), "Error deleting TO-DO item. Please try again.");
    }

    #[test]
    fn unavailable_store_maps_to_operation_failed() {
        let error = InteractionError::from_store(
            TodoOperation::Add,
            StoreError::Unavailable("lock timeout".to_owned()),
        );

        assert!(matches!(error, InteractionError::StoreOperationFailed { .. }));
        assert_eq!(error.user_message(), "Error adding TO-DO item. Please try again.");
    }

    #[test]
    fn missing_option_and_identity_messages() {
        assert_eq!(
            InteractionError::MissingRequiredOption(RequiredOption::Title).user_message(),
            "Error: Title option is required."
        );
        assert_eq!(
            InteractionError::MissingRequiredOption(RequiredOption::Id).user_message(),
            "Error: ID option is required."
        );
        assert_eq!(
            InteractionError::IdentityUnresolvable.user_message(),
            "Error: Unable to retrieve user information."
        );
    }
}
