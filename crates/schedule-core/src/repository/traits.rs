//! Repository Layer - Core Traits
//!
//! The store is the only writer of persisted schedule state. Everything
//! the UI shows is re-derived from the latest snapshot it delivers.

use async_trait::async_trait;
use tokio::sync::watch;

use crate::domain::{ItemId, NewScheduleItem, ScheduleItem, ScheduleUpdate, UserId};
use crate::error::StoreResult;
use crate::tree::sort_schedule;

/// Persistence + realtime snapshots for schedule items.
///
/// Single-threaded: futures are not `Send`, matching the browser event loop.
#[async_trait(?Send)]
pub trait ScheduleStore {
    /// Start receiving ordered snapshots of one user's items
    async fn subscribe(&self, user_id: &UserId) -> StoreResult<Subscription>;

    /// Pull fresh state for stores without server push
    async fn refresh(&self, _user_id: &UserId) -> StoreResult<()> {
        Ok(())
    }

    /// Persist a new item, returning its assigned id
    async fn create(&self, item: NewScheduleItem) -> StoreResult<ItemId>;

    /// Apply a partial update and bump `updated_at`
    async fn update(&self, id: &ItemId, update: ScheduleUpdate) -> StoreResult<()>;

    async fn delete(&self, id: &ItemId) -> StoreResult<()>;

    async fn set_completed(&self, id: &ItemId, completed: bool) -> StoreResult<()> {
        self.update(id, ScheduleUpdate::completed(completed)).await
    }
}

/// Snapshot stream for one user. Dropping it unsubscribes.
///
/// Backed by a watch channel: a slow reader skips intermediate snapshots
/// and always sees the latest one.
pub struct Subscription {
    rx: watch::Receiver<Vec<ScheduleItem>>,
    user_id: UserId,
    primed: bool,
}

impl Subscription {
    pub fn new(rx: watch::Receiver<Vec<ScheduleItem>>, user_id: UserId) -> Self {
        Self {
            rx,
            user_id,
            primed: false,
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Next snapshot, filtered to the owner and sorted.
    ///
    /// The first call yields the current state immediately. Returns None
    /// once the store side is gone.
    pub async fn next(&mut self) -> Option<Vec<ScheduleItem>> {
        if self.primed {
            self.rx.changed().await.ok()?;
        } else {
            self.primed = true;
        }
        let mut snapshot: Vec<ScheduleItem> = self
            .rx
            .borrow_and_update()
            .iter()
            .filter(|item| item.user_id == self.user_id)
            .cloned()
            .collect();
        sort_schedule(&mut snapshot);
        Some(snapshot)
    }

    /// Current snapshot without waiting
    pub fn current(&self) -> Vec<ScheduleItem> {
        let mut snapshot: Vec<ScheduleItem> = self
            .rx
            .borrow()
            .iter()
            .filter(|item| item.user_id == self.user_id)
            .cloned()
            .collect();
        sort_schedule(&mut snapshot);
        snapshot
    }
}
