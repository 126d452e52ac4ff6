pub mod config;
pub mod domain;
pub mod errors;
pub mod store;

pub use domain::todo::{ItemId, ListFilter, OwnerId, TodoItem, UnknownListFilter};
pub use errors::{InteractionError, RequiredOption, StoreError, TodoOperation};
pub use store::{InMemoryTodoStore, TodoRepository};
