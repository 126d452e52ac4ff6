use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Platform identity of the user owning a to-do list.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(pub String);

impl OwnerId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub u32);

impl ItemId {
    pub fn first() -> Self {
        Self(1)
    }

    /// The id after this one, or `None` once `u32` is exhausted.
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: ItemId,
    pub owner: OwnerId,
    pub title: String,
    pub done: bool,
}

impl TodoItem {
    pub fn new(id: ItemId, owner: OwnerId, title: impl Into<String>) -> Self {
        Self { id, owner, title: title.into(), done: false }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListFilter {
    #[default]
    Pending,
    Completed,
    All,
}

impl ListFilter {
    /// Whether `item` belongs in this view. `pinned` keeps a single item
    /// visible in the pending view even after it was completed.
    pub fn includes(self, item: &TodoItem, pinned: Option<ItemId>) -> bool {
        match self {
            Self::Pending => !item.done || pinned == Some(item.id),
            Self::Completed => item.done,
            Self::All => true,
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unsupported list filter `{0}` (expected all|pending|completed)")]
pub struct UnknownListFilter(pub String);

impl FromStr for ListFilter {
    type Err = UnknownListFilter;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "all" => Ok(Self::All),
            other => Err(UnknownListFilter(other.to_owned())),
        }
    }
}
