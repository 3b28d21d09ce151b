//! In-memory schedule store.
//!
//! Holds every item in a watch channel so subscribers see each mutation.
//! Used for tests and for running the app without a configured backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

use super::traits::{ScheduleStore, Subscription};
use crate::domain::{ItemId, NewScheduleItem, ScheduleItem, ScheduleUpdate, UserId};
use crate::error::{StoreError, StoreResult};

/// Source of store-maintained timestamps
pub type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub struct MemoryStore {
    items: watch::Sender<Vec<ScheduleItem>>,
    next_id: AtomicU64,
    clock: Clock,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Box::new(Utc::now))
    }

    pub fn with_clock(clock: Clock) -> Self {
        let (items, _) = watch::channel(Vec::new());
        Self {
            items,
            next_id: AtomicU64::new(1),
            clock,
        }
    }

    /// Replace the contents (demo data, fixtures)
    pub fn seed(&self, items: Vec<ScheduleItem>) {
        self.items.send_replace(items);
    }

    /// Every stored item, all owners, insertion order
    pub fn all_items(&self) -> Vec<ScheduleItem> {
        self.items.borrow().clone()
    }

    pub fn get(&self, id: &ItemId) -> Option<ScheduleItem> {
        self.items.borrow().iter().find(|i| &i.id == id).cloned()
    }

    fn check_parent(&self, owner: &UserId, parent: Option<&ItemId>) -> StoreResult<()> {
        let Some(parent) = parent else {
            return Ok(());
        };
        let items = self.items.borrow();
        match items.iter().find(|i| &i.id == parent) {
            Some(found) if &found.user_id == owner => Ok(()),
            Some(_) => Err(StoreError::Permission(format!("parent {} belongs to another user", parent))),
            None => Err(StoreError::NotFound(parent.clone())),
        }
    }
}

#[async_trait(?Send)]
impl ScheduleStore for MemoryStore {
    async fn subscribe(&self, user_id: &UserId) -> StoreResult<Subscription> {
        tracing::debug!(user_id = %user_id, "memory store subscription opened");
        Ok(Subscription::new(self.items.subscribe(), user_id.clone()))
    }

    async fn create(&self, item: NewScheduleItem) -> StoreResult<ItemId> {
        self.check_parent(&item.user_id, item.parent_id.as_ref())?;

        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        let id = ItemId::new(format!("mem-{}", n));
        let stored = item.into_item(id.clone(), (self.clock)());
        self.items.send_modify(|items| items.push(stored));
        tracing::debug!(item_id = %id, "memory store created item");
        Ok(id)
    }

    async fn update(&self, id: &ItemId, update: ScheduleUpdate) -> StoreResult<()> {
        let owner = self
            .get(id)
            .map(|item| item.user_id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        if let Some(parent) = &update.parent_id {
            if parent.as_ref() == Some(id) {
                return Err(StoreError::Internal(format!("item {} cannot be its own parent", id)));
            }
            self.check_parent(&owner, parent.as_ref())?;
        }

        let now = (self.clock)();
        self.items.send_modify(|items| {
            if let Some(item) = items.iter_mut().find(|i| &i.id == id) {
                update.apply_to(item);
                item.updated_at = Some(now);
            }
        });
        Ok(())
    }

    async fn delete(&self, id: &ItemId) -> StoreResult<()> {
        if self.get(id).is_none() {
            return Err(StoreError::NotFound(id.clone()));
        }
        self.items.send_modify(|items| items.retain(|i| &i.id != id));
        tracing::debug!(item_id = %id, "memory store deleted item");
        Ok(())
    }
}
