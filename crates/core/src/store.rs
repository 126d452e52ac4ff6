//! Per-owner to-do storage.
//!
//! `TodoRepository` is the seam the dispatcher talks to; `InMemoryTodoStore`
//! is the process-lifetime implementation. Every operation is a short
//! synchronous critical section over one map.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::todo::{ItemId, ListFilter, OwnerId, TodoItem};
use crate::errors::StoreError;

pub trait TodoRepository: Send + Sync {
    fn add(&self, owner: &OwnerId, title: &str) -> Result<TodoItem, StoreError>;
    fn list(&self, owner: &OwnerId) -> Vec<TodoItem>;
    fn list_filtered(
        &self,
        owner: &OwnerId,
        filter: ListFilter,
        pinned: Option<ItemId>,
    ) -> Vec<TodoItem>;
    fn mark_done(&self, owner: &OwnerId, id: ItemId) -> Result<TodoItem, StoreError>;
    fn edit(&self, owner: &OwnerId, id: ItemId, title: &str) -> Result<TodoItem, StoreError>;
    fn delete(&self, owner: &OwnerId, id: ItemId) -> Result<TodoItem, StoreError>;
}

/// One owner's items plus the highest id ever issued to them. The mark
/// survives deletes, so a retired id is never handed out again.
#[derive(Debug, Default)]
struct OwnerList {
    last_id: Option<ItemId>,
    items: Vec<TodoItem>,
}

impl OwnerList {
    fn allocate_id(&mut self) -> Result<ItemId, StoreError> {
        let id = match self.last_id {
            None => ItemId::first(),
            Some(last) => last.next().ok_or_else(|| {
                StoreError::Unavailable(format!("item id space exhausted after {last}"))
            })?,
        };
        self.last_id = Some(id);
        Ok(id)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryTodoStore {
    owners: RwLock<HashMap<OwnerId, OwnerList>>,
}

impl InMemoryTodoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of owners currently holding at least one item.
    pub fn owner_count(&self) -> usize {
        self.read().values().filter(|owned| !owned.items.is_empty()).count()
    }

    // No critical section leaves the map half-updated; poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<OwnerId, OwnerList>> {
        self.owners.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<OwnerId, OwnerList>> {
        self.owners.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn update<F>(&self, owner: &OwnerId, id: ItemId, apply: F) -> Result<TodoItem, StoreError>
    where
        F: FnOnce(&mut TodoItem),
    {
        let mut owners = self.write();
        let items = items_of(&mut owners, owner, id)?;

        let item = items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(StoreError::ItemNotFound { id, owner_has_items: true })?;
        apply(item);
        Ok(item.clone())
    }
}

fn items_of<'a>(
    owners: &'a mut HashMap<OwnerId, OwnerList>,
    owner: &OwnerId,
    id: ItemId,
) -> Result<&'a mut Vec<TodoItem>, StoreError> {
    owners
        .get_mut(owner)
        .map(|owned| &mut owned.items)
        .filter(|items| !items.is_empty())
        .ok_or(StoreError::ItemNotFound { id, owner_has_items: false })
}

impl TodoRepository for InMemoryTodoStore {
    fn add(&self, owner: &OwnerId, title: &str) -> Result<TodoItem, StoreError> {
        let mut owners = self.write();
        let owned = owners.entry(owner.clone()).or_default();
        let id = owned.allocate_id()?;
        let item = TodoItem::new(id, owner.clone(), title);
        owned.items.push(item.clone());
        Ok(item)
    }

    fn list(&self, owner: &OwnerId) -> Vec<TodoItem> {
        self.read().get(owner).map(|owned| owned.items.clone()).unwrap_or_default()
    }

    fn list_filtered(
        &self,
        owner: &OwnerId,
        filter: ListFilter,
        pinned: Option<ItemId>,
    ) -> Vec<TodoItem> {
        let owners = self.read();
        let Some(owned) = owners.get(owner) else {
            return Vec::new();
        };

        owned.items.iter().filter(|item| filter.includes(item, pinned)).cloned().collect()
    }

    fn mark_done(&self, owner: &OwnerId, id: ItemId) -> Result<TodoItem, StoreError> {
        self.update(owner, id, |item| item.done = true)
    }

    fn edit(&self, owner: &OwnerId, id: ItemId, title: &str) -> Result<TodoItem, StoreError> {
        self.update(owner, id, |item| item.title = title.to_owned())
    }

    fn delete(&self, owner: &OwnerId, id: ItemId) -> Result<TodoItem, StoreError> {
        let mut owners = self.write();
        let items = items_of(&mut owners, owner, id)?;

        let position = items
            .iter()
            .position(|item| item.id == id)
            .ok_or(StoreError::ItemNotFound { id, owner_has_items: true })?;
        // `Vec::remove` shifts survivors down without reordering them.
        Ok(items.remove(position))
    }
}
