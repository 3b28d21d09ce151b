//! Global Application State Store
//!
//! Uses Leptos reactive_stores for fine-grained reactivity. The item list
//! is always the latest snapshot pushed by the schedule store.

use chrono::{DateTime, Utc};
use leptos::prelude::*;
use reactive_stores::Store;
use schedule_core::tree::find_item;
use schedule_core::{timeline_rows, ExpansionState, ItemId, ScheduleItem, TreeRow, ViewOptions};

#[derive(Clone, Debug, Default, Store)]
pub struct AppState {
    /// Latest snapshot, filtered to the current user and sorted
    pub items: Vec<ScheduleItem>,
    /// True until the first snapshot arrives
    pub loading: bool,
    pub show_completed: bool,
    pub show_relative_time: bool,
    /// Clock for relative labels, advanced on the refresh interval
    pub now: DateTime<Utc>,
    pub expansion: ExpansionState,
}

impl AppState {
    pub fn new(view: &ViewOptions) -> Self {
        Self {
            loading: true,
            show_completed: view.show_completed,
            show_relative_time: view.show_relative_time,
            now: Utc::now(),
            ..Default::default()
        }
    }
}

pub type AppStore = Store<AppState>;

pub fn use_app_store() -> AppStore {
    expect_context::<AppStore>()
}

// ========================
// Store Helper Functions
// ========================

/// Replace the snapshot and forget collapse state of removed items
pub fn store_set_items(store: &AppStore, items: Vec<ScheduleItem>) {
    store.expansion().write().retain_known(&items);
    store.items().set(items);
    store.loading().set(false);
}

pub fn store_toggle_expanded(store: &AppStore, id: &ItemId) {
    store.expansion().write().toggle(id);
}

pub fn store_find_item(store: &AppStore, id: &ItemId) -> Option<ScheduleItem> {
    store.items().with_untracked(|items| find_item(items, id).cloned())
}

/// Untracked copy of the snapshot, for service calls that need context
pub fn store_snapshot(store: &AppStore) -> Vec<ScheduleItem> {
    store.items().get_untracked()
}

/// Rows to render, honouring the completed filter and collapse state
pub fn store_timeline_rows(store: &AppStore) -> Vec<TreeRow> {
    let show_completed = store.show_completed().get();
    store.items().with(|items| {
        store
            .expansion()
            .with(|expansion| timeline_rows(items, show_completed, expansion))
    })
}
